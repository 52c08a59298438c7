// Not every test binary uses every helper.
#![allow(dead_code)]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for Quizwire Client integration tests.
//!
//! Provides a channel-based [`MockTransport`] and helpers for constructing
//! authority event JSON.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use quizwire_client::protocol::{
    Choice, Question, QuestionPayload, ServerEvent, Standing, StatusPayload,
};
use quizwire_client::{QuizwireError, Transport};
use tokio::sync::mpsc;

type Incoming = Option<Result<String, QuizwireError>>;

// ── MockTransport ───────────────────────────────────────────────────

/// A channel-based mock transport for integration testing.
///
/// Scripted authority events are consumed in order by `recv()`; further
/// events can be fed live through the [`MockHandle`]. All messages sent by
/// the client are recorded in `sent`.
pub struct MockTransport {
    incoming: mpsc::UnboundedReceiver<Incoming>,
    sent: Arc<StdMutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

/// Test-side handle to a running [`MockTransport`].
pub struct MockHandle {
    tx: mpsc::UnboundedSender<Incoming>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockHandle {
    /// Deliver one authority event to the client.
    pub fn feed(&self, event: &ServerEvent) {
        self.tx
            .send(Some(Ok(serde_json::to_string(event).unwrap())))
            .unwrap();
    }

    /// Deliver a raw text frame to the client.
    pub fn feed_raw(&self, text: impl Into<String>) {
        self.tx.send(Some(Ok(text.into()))).unwrap();
    }

    /// Signal a clean transport close.
    pub fn close(&self) {
        self.tx.send(None).unwrap();
    }

    /// Decode all recorded outgoing intents.
    pub fn sent_intents(&self) -> Vec<quizwire_client::ClientIntent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }
}

impl MockTransport {
    pub fn new(scripted: Vec<&ServerEvent>) -> (Self, MockHandle) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        for event in scripted {
            tx.send(Some(Ok(serde_json::to_string(event).unwrap())))
                .unwrap();
        }
        let handle = MockHandle {
            tx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        let transport = Self {
            incoming: rx,
            sent,
            closed,
        };
        (transport, handle)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), QuizwireError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, QuizwireError>> {
        match self.incoming.recv().await {
            Some(item) => item,
            // Handle dropped without a scripted close; stay open.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), QuizwireError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── Fixture builders ────────────────────────────────────────────────

/// Wall-clock now in seconds, matching the client's native timestamp unit.
pub fn now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A four-choice question fixture.
pub fn sample_question(id: &str, duration: u32) -> Question {
    Question {
        id: id.into(),
        text: "Which planet is known as the Red Planet?".into(),
        choices: Some(vec![
            Choice { id: "a".into(), text: "Venus".into() },
            Choice { id: "b".into(), text: "Mars".into() },
            Choice { id: "c".into(), text: "Jupiter".into() },
            Choice { id: "d".into(), text: "Mercury".into() },
        ]),
        answer: None,
        duration,
        hint: Some("It is named after a god of war.".into()),
    }
}

/// A `question` event anchored at the given authority timestamps.
pub fn question_event(index: u32, duration: u32, started_at: f64, server_time: f64) -> ServerEvent {
    ServerEvent::Question(Box::new(QuestionPayload {
        question: sample_question(&format!("q{index}"), duration),
        index,
        duration,
        started_at,
        remaining: None,
        server_time,
    }))
}

/// A `question` event starting fresh right now.
pub fn question_now(index: u32, duration: u32) -> ServerEvent {
    let t = now();
    question_event(index, duration, t, t)
}

/// A minimal `status` event with no timing fields.
pub fn status_event(index: u32, total: u32, paused: bool, revealed: bool) -> ServerEvent {
    ServerEvent::Status(StatusPayload {
        index,
        total,
        paused,
        revealed,
        duration: None,
        started_at: None,
        remaining: None,
        server_time: None,
        complete: false,
    })
}

/// A `joined` acknowledgment.
pub fn joined_event(code: Option<&str>) -> ServerEvent {
    ServerEvent::Joined {
        participant_code: code.map(str::to_owned),
    }
}

/// A leaderboard row.
pub fn standing(id: &str, name: &str, score: i64) -> Standing {
    Standing {
        id: id.into(),
        name: name.into(),
        score,
        participant_code: None,
        firsts: None,
        cumulative_time: None,
        online: None,
    }
}
