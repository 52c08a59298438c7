//! # Quizwire Client
//!
//! Transport-agnostic Rust client for the Quizwire live quiz session
//! protocol.
//!
//! This crate keeps a contestant, display or admin surface synchronized with
//! the session authority over any bidirectional text transport: it estimates
//! server clock skew, drives the question lifecycle, runs the answer-lock
//! pipeline with optimistic locking, coordinates lifelines and mirrors the
//! leaderboard channel.
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] trait for any backend
//! - **WebSocket built-in** — default `transport-websocket` feature provides
//!   [`WebSocketTransport`](transports::websocket::WebSocketTransport)
//! - **Event-driven** — receive typed [`QuizwireEvent`]s via a channel
//! - **Deterministic state** — one reducer applies every authority event, so
//!   any surface can replay a session from its event log
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quizwire_client::{
//!     client::{ContestantIdentity, QuizwireClient, QuizwireConfig},
//!     event::QuizwireEvent,
//!     transports::websocket::WebSocketTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = WebSocketTransport::connect("ws://localhost:8080/ws").await?;
//!     let identity = ContestantIdentity::new("Alice", "p-81f3");
//!     let (client, mut events) =
//!         QuizwireClient::start(transport, QuizwireConfig::contestant(identity));
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             QuizwireEvent::QuestionStarted { question, .. } => {
//!                 println!("Q: {}", question.text);
//!                 client.submit_answer("b").await?;
//!             }
//!             QuizwireEvent::Disconnected { .. } => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "tokio-runtime")]
pub mod client;
pub mod clock;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(feature = "transport-websocket")]
pub mod transports;

// Re-export primary types for ergonomic imports.
#[cfg(feature = "tokio-runtime")]
pub use client::{ContestantIdentity, QuizwireClient, QuizwireConfig, Role};
pub use clock::ClockSync;
pub use error::QuizwireError;
pub use event::QuizwireEvent;
pub use protocol::{ClientIntent, ServerEvent};
pub use session::{AnswerLock, LeaveReason, QuestionPhase, SessionState};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::websocket::WebSocketTransport;
