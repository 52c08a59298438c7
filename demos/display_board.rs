//! # Display Board Example
//!
//! Drives a read-only display surface against an in-process loopback
//! transport, showing how to implement the [`Transport`] trait for a custom
//! backend. This is useful for:
//!
//! - **Testing** — exercise a display UI without a real authority
//! - **Custom backends** — adapt any I/O layer (TCP, QUIC, server-sent events)
//!
//! ## Running
//!
//! ```sh
//! cargo run --example display_board --no-default-features --features tokio-runtime
//! ```

use async_trait::async_trait;
use quizwire_client::{
    QuizwireClient, QuizwireConfig, QuizwireError, QuizwireEvent, Transport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: Define a channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// A loopback transport that shuttles messages through in-process channels.
///
/// Two halves:
/// - The **client half** (`LoopbackTransport`) implements [`Transport`] and
///   is handed to `QuizwireClient::start`.
/// - The **authority half** (`LoopbackAuthority`) lets you inject events and
///   read what the client sent.
pub struct LoopbackTransport {
    /// Messages the client sends go here (authority reads the other end).
    tx: mpsc::UnboundedSender<String>,
    /// Messages the authority sends arrive here (client reads them).
    rx: mpsc::UnboundedReceiver<String>,
}

/// The "authority side" of the loopback — use this to drive the session.
pub struct LoopbackAuthority {
    /// Read what the client sent.
    pub rx: mpsc::UnboundedReceiver<String>,
    /// Send events to the client (as if they came from the authority).
    pub tx: mpsc::UnboundedSender<String>,
}

/// Create a connected `(transport, authority)` pair.
fn loopback_pair() -> (LoopbackTransport, LoopbackAuthority) {
    // Client → Authority channel
    let (client_tx, authority_rx) = mpsc::unbounded_channel();
    // Authority → Client channel
    let (authority_tx, client_rx) = mpsc::unbounded_channel();

    let transport = LoopbackTransport {
        tx: client_tx,
        rx: client_rx,
    };
    let authority = LoopbackAuthority {
        rx: authority_rx,
        tx: authority_tx,
    };

    (transport, authority)
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: Implement the Transport trait
// ─────────────────────────────────────────────────────────────────────

#[async_trait]
impl Transport for LoopbackTransport {
    /// Send a JSON envelope to the "authority" side of the loopback.
    async fn send(&mut self, message: String) -> Result<(), QuizwireError> {
        self.tx
            .send(message)
            .map_err(|e| QuizwireError::TransportSend(e.to_string()))
    }

    /// Receive the next event from the "authority" side.
    ///
    /// Returns `None` when the authority channel is closed — this is how the
    /// client discovers that the connection has ended.
    ///
    /// This method is **cancel-safe** because `mpsc::UnboundedReceiver::recv`
    /// is cancel-safe.
    async fn recv(&mut self) -> Option<Result<String, QuizwireError>> {
        self.rx.recv().await.map(Ok)
    }

    /// Close is a no-op for channels — dropping is sufficient.
    async fn close(&mut self) -> Result<(), QuizwireError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Drive a scripted session through the loopback
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, mut authority) = loopback_pair();
    let (mut client, mut event_rx) =
        QuizwireClient::start(transport, QuizwireConfig::display());

    // Play the authority: acknowledge the join, run one question, show the
    // leaderboard, then finish.
    tokio::spawn(async move {
        // The first client message is the join_display handshake.
        let join = authority.rx.recv().await;
        tracing::debug!("authority saw: {join:?}");

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let script = [
            r#"{"type":"joined","data":{}}"#.to_string(),
            format!(
                r#"{{"type":"question","data":{{"question":{{"id":"q0","text":"Which planet is known as the Red Planet?","choices":[{{"id":"a","text":"Venus"}},{{"id":"b","text":"Mars"}}],"duration":5}},"index":0,"duration":5,"startedAt":{now},"serverTime":{now}}}}}"#
            ),
            r#"{"type":"reveal","data":{"correctAnswer":"b"}}"#.to_string(),
            r#"{"type":"leaderboard_show","data":[{"id":"p-1","name":"Alice","score":120},{"id":"p-2","name":"Bob","score":80}]}"#.to_string(),
            r#"{"type":"complete"}"#.to_string(),
        ];
        for line in script {
            if authority.tx.send(line).is_err() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        }
        // Dropping `authority.tx` closes the loopback, disconnecting the client.
    });

    while let Some(event) = event_rx.recv().await {
        match event {
            QuizwireEvent::QuestionStarted { question, index, time_left } => {
                tracing::info!("Q{} ({time_left}s): {}", index + 1, question.text);
            }
            QuizwireEvent::TimeLeft(seconds) => tracing::info!("⏱ {seconds}s"),
            QuizwireEvent::Revealed { correct_answer } => {
                tracing::info!("Answer: {}", correct_answer.as_deref().unwrap_or("(withheld)"));
            }
            QuizwireEvent::LeaderboardShown { standings } => {
                for (rank, row) in standings.iter().enumerate() {
                    tracing::info!("  #{} {} — {}", rank + 1, row.name, row.score);
                }
            }
            QuizwireEvent::SessionComplete => tracing::info!("Session complete"),
            QuizwireEvent::Disconnected { .. } => break,
            other => tracing::debug!("{other:?}"),
        }
    }

    client.shutdown().await;
    Ok(())
}
