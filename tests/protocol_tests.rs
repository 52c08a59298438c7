#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for the Quizwire protocol types.
//!
//! Verifies that every `ClientIntent` serializes to the exact envelope the
//! authority expects, and that authority JSON fixtures deserialize into the
//! right `ServerEvent` variants, including the camelCase payload keys and
//! the `halve-choices` lifeline wire string.

use quizwire_client::protocol::{
    ClientIntent, DenyReason, LifelineKind, RejectReason, ServerEvent,
};
use serde_json::json;

// ════════════════════════════════════════════════════════════════════
// Outbound intents — exact wire shape
// ════════════════════════════════════════════════════════════════════

#[test]
fn join_contestant_wire_shape() {
    let intent = ClientIntent::JoinContestant {
        name: "Alice".into(),
        participant_id: "p-81f3".into(),
        contact_code: Some("alice@example.com".into()),
    };
    let value: serde_json::Value = serde_json::to_value(&intent).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "join_contestant",
            "data": {
                "name": "Alice",
                "participantId": "p-81f3",
                "contactCode": "alice@example.com"
            }
        })
    );
}

#[test]
fn join_contestant_omits_absent_contact_code() {
    let intent = ClientIntent::JoinContestant {
        name: "Bob".into(),
        participant_id: "p-2".into(),
        contact_code: None,
    };
    let value: serde_json::Value = serde_json::to_value(&intent).unwrap();
    assert!(value["data"].get("contactCode").is_none());
}

#[test]
fn join_display_wire_shape() {
    let value = serde_json::to_value(&ClientIntent::JoinDisplay).unwrap();
    assert_eq!(value, json!({"type": "join_display"}));
}

#[test]
fn join_admin_wire_shape() {
    let value = serde_json::to_value(&ClientIntent::JoinAdmin {
        token: "changeme".into(),
    })
    .unwrap();
    assert_eq!(
        value,
        json!({"type": "join_admin", "data": {"token": "changeme"}})
    );
}

#[test]
fn submit_answer_wire_shape() {
    let value = serde_json::to_value(&ClientIntent::SubmitAnswer { answer: "b".into() }).unwrap();
    assert_eq!(
        value,
        json!({"type": "submit_answer", "data": {"answer": "b"}})
    );
}

#[test]
fn lifeline_request_uses_hyphenated_kind() {
    let value = serde_json::to_value(&ClientIntent::LifelineRequest {
        lifeline: LifelineKind::HalveChoices,
    })
    .unwrap();
    assert_eq!(
        value,
        json!({"type": "lifeline_request", "data": {"lifeline": "halve-choices"}})
    );

    let value = serde_json::to_value(&ClientIntent::LifelineRequest {
        lifeline: LifelineKind::Hint,
    })
    .unwrap();
    assert_eq!(value["data"]["lifeline"], "hint");
}

// ════════════════════════════════════════════════════════════════════
// Inbound events — authority fixtures
// ════════════════════════════════════════════════════════════════════

#[test]
fn question_fixture_deserializes() {
    let raw = r#"{
        "type": "question",
        "data": {
            "question": {
                "id": "q3",
                "text": "Which planet is known as the Red Planet?",
                "choices": [
                    {"id": "a", "text": "Venus"},
                    {"id": "b", "text": "Mars"}
                ],
                "duration": 20,
                "hint": "It is named after a god of war."
            },
            "index": 3,
            "duration": 20,
            "startedAt": 1756600000.0,
            "remaining": 17.4,
            "serverTime": 1756600002.6
        }
    }"#;
    let event: ServerEvent = serde_json::from_str(raw).unwrap();
    let ServerEvent::Question(payload) = event else {
        panic!("expected Question variant");
    };
    assert_eq!(payload.index, 3);
    assert_eq!(payload.question.id, "q3");
    assert_eq!(payload.question.answer, None);
    assert_eq!(payload.remaining, Some(17.4));
    assert!((payload.started_at - 1_756_600_000.0).abs() < f64::EPSILON);
}

#[test]
fn question_without_choices_is_free_text() {
    let raw = r#"{
        "type": "question",
        "data": {
            "question": {"id": "q0", "text": "Name the capital of France.", "duration": 30},
            "index": 0,
            "duration": 30,
            "startedAt": 100.0,
            "serverTime": 100.0
        }
    }"#;
    let event: ServerEvent = serde_json::from_str(raw).unwrap();
    let ServerEvent::Question(payload) = event else {
        panic!("expected Question variant");
    };
    assert!(payload.question.choices.is_none());
    assert!(payload.question.hint.is_none());
    assert!(payload.remaining.is_none());
}

#[test]
fn status_fixture_with_partial_timing() {
    let raw = r#"{
        "type": "status",
        "data": {
            "index": 4,
            "total": 12,
            "paused": false,
            "revealed": true,
            "remaining": 7.4,
            "serverTime": 1756600010.0
        }
    }"#;
    let event: ServerEvent = serde_json::from_str(raw).unwrap();
    let ServerEvent::Status(status) = event else {
        panic!("expected Status variant");
    };
    assert_eq!(status.index, 4);
    assert_eq!(status.total, 12);
    assert!(status.revealed);
    assert!(!status.complete);
    assert_eq!(status.remaining, Some(7.4));
    assert!(status.started_at.is_none());
}

#[test]
fn reveal_fixture_deserializes() {
    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"reveal","data":{"correctAnswer":"b"}}"#).unwrap();
    assert_eq!(
        event,
        ServerEvent::Reveal {
            correct_answer: Some("b".into())
        }
    );
    // The authority may withhold the answer (reveal-without-disclosure).
    let event: ServerEvent = serde_json::from_str(r#"{"type":"reveal","data":{}}"#).unwrap();
    assert_eq!(event, ServerEvent::Reveal { correct_answer: None });
}

#[test]
fn answer_lock_fixtures_deserialize() {
    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"answer_locked","data":{"answer":"b"}}"#).unwrap();
    assert_eq!(event, ServerEvent::AnswerLocked { answer: Some("b".into()) });

    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"answer_rejected","data":{"reason":"late_submission"}}"#)
            .unwrap();
    assert_eq!(
        event,
        ServerEvent::AnswerRejected {
            reason: RejectReason::LateSubmission
        }
    );
}

#[test]
fn answer_result_fixture_deserializes() {
    let raw = r#"{
        "type": "answer_result",
        "data": {"correct": true, "score": 320, "rank": 1, "awarded": 120}
    }"#;
    let event: ServerEvent = serde_json::from_str(raw).unwrap();
    let ServerEvent::AnswerResult(result) = event else {
        panic!("expected AnswerResult variant");
    };
    assert!(result.correct);
    assert_eq!(result.score, 320);
    assert_eq!(result.rank, Some(1));
    assert_eq!(result.awarded, 120);
}

#[test]
fn lifeline_fixtures_deserialize() {
    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"lifeline_status","data":{"halve-choices":false,"hint":true}}"#,
    )
    .unwrap();
    let ServerEvent::LifelineStatus(availability) = event else {
        panic!("expected LifelineStatus variant");
    };
    assert!(!availability.halve_choices);
    assert!(availability.hint);
    assert!(!availability.enabled(LifelineKind::HalveChoices));

    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"lifeline_halve_choices","data":{"keepIds":["b","d"]}}"#,
    )
    .unwrap();
    assert_eq!(
        event,
        ServerEvent::LifelineHalveChoices {
            keep_ids: vec!["b".into(), "d".into()]
        }
    );

    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"lifeline_hint","data":{"hint":"Think red."}}"#).unwrap();
    assert_eq!(event, ServerEvent::LifelineHint { hint: "Think red.".into() });

    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"lifeline_denied","data":{"lifeline":"halve-choices","reason":"disabled"}}"#,
    )
    .unwrap();
    assert_eq!(
        event,
        ServerEvent::LifelineDenied {
            lifeline: LifelineKind::HalveChoices,
            reason: DenyReason::Disabled
        }
    );
}

#[test]
fn leaderboard_fixtures_deserialize() {
    let raw = r#"{
        "type": "leaderboard_show",
        "data": [
            {"id": "p-1", "name": "Alice", "score": 320, "firsts": 2, "cumTime": 41.2},
            {"id": "p-2", "name": "Bob", "score": 280, "online": false}
        ]
    }"#;
    let event: ServerEvent = serde_json::from_str(raw).unwrap();
    let ServerEvent::LeaderboardShow(standings) = event else {
        panic!("expected LeaderboardShow variant");
    };
    assert_eq!(standings.len(), 2);
    assert_eq!(standings[0].firsts, Some(2));
    assert_eq!(standings[0].cumulative_time, Some(41.2));
    assert_eq!(standings[1].online, Some(false));

    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"leaderboard_hide"}"#).unwrap();
    assert_eq!(event, ServerEvent::LeaderboardHide);
}

#[test]
fn bare_control_events_deserialize() {
    for (raw, expected) in [
        (r#"{"type":"paused"}"#, ServerEvent::Paused),
        (r#"{"type":"resumed"}"#, ServerEvent::Resumed),
        (r#"{"type":"complete"}"#, ServerEvent::Complete),
        (r#"{"type":"reset"}"#, ServerEvent::Reset),
        (r#"{"type":"replaced"}"#, ServerEvent::Replaced),
    ] {
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event, expected, "fixture: {raw}");
    }
}

#[test]
fn joined_and_error_fixtures_deserialize() {
    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"joined","data":{"participantCode":"alice@example.com"}}"#,
    )
    .unwrap();
    assert_eq!(
        event,
        ServerEvent::Joined {
            participant_code: Some("alice@example.com".into())
        }
    );

    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"error","data":{"message":"unauthorized"}}"#).unwrap();
    assert_eq!(event, ServerEvent::Error { message: "unauthorized".into() });
}

// ════════════════════════════════════════════════════════════════════
// Forward compatibility
// ════════════════════════════════════════════════════════════════════

#[test]
fn unknown_reject_reason_maps_to_other() {
    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"answer_rejected","data":{"reason":"quota_exceeded"}}"#,
    )
    .unwrap();
    assert_eq!(
        event,
        ServerEvent::AnswerRejected {
            reason: RejectReason::Other
        }
    );
}

#[test]
fn unknown_deny_reason_maps_to_other() {
    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"lifeline_denied","data":{"lifeline":"hint","reason":"rate_limited"}}"#,
    )
    .unwrap();
    assert_eq!(
        event,
        ServerEvent::LifelineDenied {
            lifeline: LifelineKind::Hint,
            reason: DenyReason::Other
        }
    );
}

#[test]
fn reason_descriptions_are_stable() {
    assert_eq!(
        RejectReason::LateSubmission.to_string(),
        "Time was already up when your answer arrived."
    );
    assert_eq!(
        DenyReason::AlreadyUsed.to_string(),
        "You already used this lifeline on this question."
    );
}
