//! # Contestant Example
//!
//! Demonstrates a complete contestant lifecycle:
//!
//! 1. Connect to a Quizwire session authority via WebSocket
//! 2. Join as a contestant
//! 3. React to session events (questions, countdown, reveals, leaderboard)
//! 4. Submit an answer and request a lifeline
//! 5. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # Start a Quizwire authority on localhost:8080, then:
//! cargo run --example contestant
//!
//! # Override the server URL or the displayed name:
//! QUIZWIRE_URL=ws://my-server:8080/ws QUIZWIRE_NAME=Alice cargo run --example contestant
//! ```

use quizwire_client::{
    client::ContestantIdentity, protocol::LifelineKind, QuizwireClient, QuizwireConfig,
    QuizwireEvent, WebSocketTransport,
};

/// Default authority URL when `QUIZWIRE_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:8080/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("QUIZWIRE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let name = std::env::var("QUIZWIRE_NAME").unwrap_or_else(|_| "RustContestant".to_string());
    tracing::info!("Connecting to {url} as {name}");

    // ── Connect ─────────────────────────────────────────────────────
    let transport = WebSocketTransport::connect(&url).await?;

    // Replace the participant id with the one issued at registration.
    let identity = ContestantIdentity::new(name, "p-demo-0001");
    let config = QuizwireConfig::contestant(identity);

    // Start the client. This spawns a background task that drives the
    // transport and emits events on `event_rx`.
    let (mut client, mut event_rx) = QuizwireClient::start(transport, config);

    // ── Event loop ──────────────────────────────────────────────────
    // Use `tokio::select!` to listen for both session events and Ctrl+C.
    loop {
        tokio::select! {
            // Branch 1: Incoming event from the authority (or transport layer).
            event = event_rx.recv() => {
                let Some(event) = event else {
                    // Channel closed — transport loop exited.
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    // ── Synthetic: transport connected ───────────────
                    QuizwireEvent::Connected => {
                        tracing::info!("Transport connected, awaiting join acknowledgment…");
                    }

                    QuizwireEvent::Joined { participant_code } => {
                        tracing::info!(
                            "Joined the session (code: {})",
                            participant_code.as_deref().unwrap_or("n/a")
                        );
                    }

                    // ── Question lifecycle ───────────────────────────
                    QuizwireEvent::QuestionStarted { question, index, time_left } => {
                        tracing::info!("Question {}: {} ({time_left}s)", index + 1, question.text);
                        if let Some(choices) = &question.choices {
                            for choice in choices {
                                tracing::info!("  [{}] {}", choice.id, choice.text);
                            }
                            // A real UI would wait for input; the demo just
                            // picks the first choice and asks for a hint.
                            if let Some(first) = choices.first() {
                                client.submit_answer(first.id.clone()).await?;
                                tracing::info!("Submitted answer {}", first.id);
                            }
                            client.request_lifeline(LifelineKind::Hint).await.ok();
                        }
                    }

                    QuizwireEvent::TimeLeft(seconds) => {
                        tracing::info!("⏱ {seconds}s left");
                    }

                    QuizwireEvent::Paused => tracing::info!("Countdown paused"),
                    QuizwireEvent::Resumed => tracing::info!("Countdown resumed"),

                    QuizwireEvent::Revealed { correct_answer } => {
                        tracing::info!(
                            "Correct answer: {}",
                            correct_answer.as_deref().unwrap_or("(withheld)")
                        );
                    }

                    // ── Answer pipeline ──────────────────────────────
                    QuizwireEvent::AnswerLocked { answer } => {
                        tracing::info!(
                            "Answer locked in: {}",
                            answer.as_deref().unwrap_or("(unspecified)")
                        );
                    }

                    QuizwireEvent::AnswerRejected { reason } => {
                        tracing::warn!("Answer rejected: {reason}");
                    }

                    QuizwireEvent::AnswerResult(result) => {
                        tracing::info!(
                            "{} — +{} points (total {})",
                            if result.correct { "Correct!" } else { "Wrong" },
                            result.awarded,
                            result.score
                        );
                    }

                    // ── Lifelines ────────────────────────────────────
                    QuizwireEvent::HintRevealed { hint } => {
                        tracing::info!("Hint: {hint}");
                    }

                    QuizwireEvent::ChoicesNarrowed { keep_ids } => {
                        tracing::info!("Remaining choices: {keep_ids:?}");
                    }

                    QuizwireEvent::LifelineDenied { lifeline, reason } => {
                        tracing::warn!("Lifeline {lifeline:?} denied: {reason}");
                    }

                    // ── Leaderboard ──────────────────────────────────
                    QuizwireEvent::LeaderboardShown { standings } => {
                        for (rank, row) in standings.iter().enumerate() {
                            tracing::info!("  #{} {} — {}", rank + 1, row.name, row.score);
                        }
                    }

                    // ── End of session ───────────────────────────────
                    QuizwireEvent::SessionComplete => {
                        tracing::info!("Quiz complete, thanks for playing!");
                    }

                    QuizwireEvent::SessionEnded { reason } => {
                        tracing::warn!("Removed from session: {reason}");
                        break;
                    }

                    QuizwireEvent::AuthorityError { message } => {
                        tracing::error!("Authority error: {message}");
                    }

                    QuizwireEvent::Disconnected { reason } => {
                        tracing::warn!(
                            "Disconnected: {}",
                            reason.as_deref().unwrap_or("unknown")
                        );
                        break;
                    }

                    other => {
                        tracing::debug!("Unhandled event: {other:?}");
                    }
                }
            }

            // Branch 2: Ctrl+C
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Graceful shutdown ───────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Goodbye!");
    Ok(())
}
