#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! End-to-end client tests against a mock transport.
//!
//! Each test scripts a sequence of authority events, drives the client handle
//! like an application would, and asserts both the emitted event stream and
//! the session projection.

mod common;

use std::time::Duration;

use common::{joined_event, question_now, standing, status_event, MockTransport};
use quizwire_client::client::{ContestantIdentity, QuizwireClient, QuizwireConfig};
use quizwire_client::protocol::{ClientIntent, LifelineKind, RejectReason, ServerEvent};
use quizwire_client::{LeaveReason, QuizwireError, QuizwireEvent};
use tokio::sync::mpsc;

async fn next_matching(
    events: &mut mpsc::Receiver<QuizwireEvent>,
    mut pred: impl FnMut(&QuizwireEvent) -> bool,
) -> QuizwireEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        if pred(&event) {
            return event;
        }
    }
}

fn alice() -> QuizwireConfig {
    QuizwireConfig::contestant(
        ContestantIdentity::new("Alice", "p-1").with_contact_code("alice@example.com"),
    )
}

#[tokio::test]
async fn contestant_full_round() {
    let (transport, mock) = MockTransport::new(vec![
        &joined_event(Some("alice@example.com")),
        &question_now(0, 20),
    ]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    // Handshake.
    next_matching(&mut events, |e| matches!(e, QuizwireEvent::Joined { .. })).await;
    assert!(client.is_joined());

    // Question arrives; submit and get the lock confirmed.
    let event = next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::QuestionStarted { .. })
    })
    .await;
    let QuizwireEvent::QuestionStarted { question, index, time_left } = event else {
        unreachable!();
    };
    assert_eq!(index, 0);
    assert_eq!(time_left, 20);
    assert_eq!(question.choices.as_ref().unwrap().len(), 4);

    client.submit_answer("b").await.unwrap();
    mock.feed(&ServerEvent::AnswerLocked { answer: Some("b".into()) });
    next_matching(&mut events, |e| matches!(e, QuizwireEvent::AnswerLocked { .. })).await;
    assert!(client.is_locked().await);

    // Reveal, per-participant result, leaderboard.
    mock.feed(&ServerEvent::Reveal { correct_answer: Some("b".into()) });
    let event = next_matching(&mut events, |e| matches!(e, QuizwireEvent::Revealed { .. })).await;
    assert_eq!(
        event,
        QuizwireEvent::Revealed { correct_answer: Some("b".into()) }
    );

    mock.feed(&ServerEvent::LeaderboardShow(vec![
        standing("p-1", "Alice", 120),
        standing("p-2", "Bob", 0),
    ]));
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::LeaderboardShown { .. })
    })
    .await;
    let session = client.session().await;
    assert!(session.leaderboard_visible());
    assert_eq!(session.standings()[0].name, "Alice");

    // Session completes.
    mock.feed(&ServerEvent::Complete);
    next_matching(&mut events, |e| matches!(e, QuizwireEvent::SessionComplete)).await;

    client.shutdown().await;
    assert!(mock.closed.load(std::sync::atomic::Ordering::Relaxed));
}

#[tokio::test]
async fn submission_after_reveal_is_blocked_without_network() {
    let (transport, mock) = MockTransport::new(vec![
        &joined_event(None),
        &question_now(0, 20),
        &ServerEvent::Reveal { correct_answer: Some("b".into()) },
    ]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| matches!(e, QuizwireEvent::Revealed { .. })).await;

    let sent_before = mock.sent.lock().unwrap().len();
    let err = client.submit_answer("a").await.unwrap_err();
    assert!(matches!(err, QuizwireError::SubmitBlocked(_)));
    assert_eq!(mock.sent.lock().unwrap().len(), sent_before);

    client.shutdown().await;
}

#[tokio::test]
async fn rejection_rolls_back_then_resubmission_succeeds() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None), &question_now(0, 30)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::QuestionStarted { .. })
    })
    .await;

    client.submit_answer("q").await.unwrap();
    mock.feed(&ServerEvent::AnswerRejected {
        reason: RejectReason::InvalidChoice,
    });
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::AnswerRejected { .. })
    })
    .await;

    // Rollback: the pipeline is open again and the retry goes out.
    client.submit_answer("b").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let intents = mock.sent_intents();
    let submits: Vec<_> = intents
        .iter()
        .filter(|i| matches!(i, ClientIntent::SubmitAnswer { .. }))
        .collect();
    assert_eq!(submits.len(), 2);

    client.shutdown().await;
}

#[tokio::test]
async fn display_flow_leaderboard_visibility_is_orthogonal_to_data() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None)]);
    let (mut client, mut events) =
        QuizwireClient::start(transport, QuizwireConfig::display());

    next_matching(&mut events, |e| matches!(e, QuizwireEvent::Joined { .. })).await;
    {
        let intents = mock.sent_intents();
        assert_eq!(intents[0], ClientIntent::JoinDisplay);
    }

    // Data refresh alone never shows the leaderboard.
    mock.feed(&ServerEvent::Leaderboard(vec![standing("p-1", "Alice", 100)]));
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::LeaderboardUpdated { .. })
    })
    .await;
    assert!(!client.session().await.leaderboard_visible());

    mock.feed(&ServerEvent::LeaderboardShow(vec![standing("p-1", "Alice", 100)]));
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::LeaderboardShown { .. })
    })
    .await;
    assert!(client.session().await.leaderboard_visible());

    // Hide keeps the data, drops the visibility; a later refresh stays hidden.
    mock.feed(&ServerEvent::LeaderboardHide);
    next_matching(&mut events, |e| matches!(e, QuizwireEvent::LeaderboardHidden)).await;
    mock.feed(&ServerEvent::Leaderboard(vec![standing("p-1", "Alice", 220)]));
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::LeaderboardUpdated { .. })
    })
    .await;
    let session = client.session().await;
    assert!(!session.leaderboard_visible());
    assert_eq!(session.standings()[0].score, 220);

    client.shutdown().await;
}

#[tokio::test]
async fn halve_choices_grant_narrows_visible_choices() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None), &question_now(0, 30)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::QuestionStarted { .. })
    })
    .await;

    client
        .request_lifeline(LifelineKind::HalveChoices)
        .await
        .unwrap();
    mock.feed(&ServerEvent::LifelineHalveChoices {
        keep_ids: vec!["b".into(), "d".into()],
    });
    let event = next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::ChoicesNarrowed { .. })
    })
    .await;
    assert_eq!(
        event,
        QuizwireEvent::ChoicesNarrowed {
            keep_ids: vec!["b".into(), "d".into()]
        }
    );

    let session = client.session().await;
    let visible = session.visible_choices().unwrap();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|c| c.id == "b" || c.id == "d"));
    assert!(session.lifelines_used().used(LifelineKind::HalveChoices));

    client.shutdown().await;
}

#[tokio::test]
async fn denied_lifeline_stays_available() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None), &question_now(0, 30)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::QuestionStarted { .. })
    })
    .await;

    client.request_lifeline(LifelineKind::Hint).await.unwrap();
    mock.feed(&ServerEvent::LifelineDenied {
        lifeline: LifelineKind::Hint,
        reason: quizwire_client::protocol::DenyReason::Disabled,
    });
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::LifelineDenied { .. })
    })
    .await;

    // Denial never consumes the flag; once the admin re-enables it the same
    // lifeline can be requested again.
    let session = client.session().await;
    assert!(!session.lifelines_used().used(LifelineKind::Hint));

    client.shutdown().await;
}

#[tokio::test]
async fn status_supersedes_wholesale() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None), &question_now(2, 30)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::QuestionStarted { .. })
    })
    .await;

    mock.feed(&status_event(2, 10, true, false));
    let event = next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::StatusUpdated { .. })
    })
    .await;
    let QuizwireEvent::StatusUpdated { index, total, paused, revealed, .. } = event else {
        unreachable!();
    };
    assert_eq!((index, total, paused, revealed), (2, 10, true, false));

    // A newer status replaces the previous one; paused clears.
    mock.feed(&status_event(2, 10, false, false));
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::StatusUpdated { .. })
    })
    .await;
    let session = client.session().await;
    assert!(!session.paused());
    assert_eq!(session.total(), Some(10));

    client.shutdown().await;
}

#[tokio::test]
async fn replaced_terminates_connection_and_discards_state() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None), &question_now(0, 30)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::QuestionStarted { .. })
    })
    .await;

    mock.feed(&ServerEvent::Replaced);
    let event = next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::SessionEnded { .. })
    })
    .await;
    assert_eq!(
        event,
        QuizwireEvent::SessionEnded { reason: LeaveReason::Replaced }
    );
    next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::Disconnected { .. })
    })
    .await;

    assert!(mock.closed.load(std::sync::atomic::Ordering::Relaxed));
    assert!(!client.is_connected());
    assert!(!client.is_joined());
    let session = client.session().await;
    assert!(session.question().is_none());
    assert!(session.standings().is_empty());

    // Further intents fail locally.
    let err = client.submit_answer("a").await.unwrap_err();
    assert!(matches!(err, QuizwireError::NotConnected));

    client.shutdown().await;
}

#[tokio::test]
async fn clean_close_emits_disconnected_with_no_reason() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| matches!(e, QuizwireEvent::Joined { .. })).await;
    mock.close();

    let event = next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::Disconnected { .. })
    })
    .await;
    assert_eq!(event, QuizwireEvent::Disconnected { reason: None });

    client.shutdown().await;
}

#[tokio::test]
async fn unknown_event_type_is_ignored() {
    let (transport, mock) = MockTransport::new(vec![&joined_event(None)]);
    let (mut client, mut events) = QuizwireClient::start(transport, alice());

    next_matching(&mut events, |e| matches!(e, QuizwireEvent::Joined { .. })).await;

    // A frame from a newer authority; the loop logs and carries on.
    mock.feed_raw(r#"{"type":"confetti","data":{"amount":"lots"}}"#);
    mock.feed(&status_event(0, 5, false, false));

    let event = next_matching(&mut events, |e| {
        matches!(e, QuizwireEvent::StatusUpdated { .. })
    })
    .await;
    assert!(matches!(event, QuizwireEvent::StatusUpdated { .. }));

    client.shutdown().await;
}
