//! Transport abstraction for the Quizwire session protocol.
//!
//! The [`Transport`] trait defines a bidirectional text message channel
//! between a client role and the session authority. The protocol uses JSON
//! text envelopes, so every transport implementation must handle message
//! framing internally (WebSocket frames, length-prefixed TCP, and so on).
//!
//! # Connection Setup
//!
//! Connection setup is intentionally NOT part of this trait — different
//! transports have fundamentally different connection parameters (URLs for
//! WebSocket, host:port for TCP). Construct a connected transport
//! externally, then pass it to `QuizwireClient::start`.
//!
//! # Ordering
//!
//! Implementations must deliver messages for a given session in send order.
//! No ordering guarantee is required across different clients.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use quizwire_client::error::QuizwireError;
//! use quizwire_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), QuizwireError> {
//!         // Send the JSON envelope over your transport
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, QuizwireError>> {
//!         // Receive the next JSON envelope
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), QuizwireError> {
//!         // Gracefully shut down the connection
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::QuizwireError;

/// A bidirectional text message transport between one client role and the
/// session authority.
///
/// Implementors shuttle serialized JSON envelopes in both directions. Each
/// call to [`send`](Transport::send) transmits one complete envelope; each
/// call to [`recv`](Transport::recv) returns one complete envelope.
///
/// # Object Safety
///
/// This trait is object-safe, so `Box<dyn Transport>` works for dynamic
/// dispatch. `QuizwireClient::start` accepts `impl Transport` (monomorphized)
/// for the common case.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it is
/// used inside `tokio::select!`. If `recv` is cancelled before completion,
/// calling it again must not lose data. Channel-based implementations (e.g.,
/// wrapping `mpsc::Receiver`) are naturally cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON envelope to the session authority.
    ///
    /// # Errors
    ///
    /// Returns [`QuizwireError::TransportSend`] if the message could not be
    /// sent (e.g., connection broken, write buffer full).
    async fn send(&mut self, message: String) -> Result<(), QuizwireError>;

    /// Receive the next JSON envelope from the session authority.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete message was received
    /// - `Some(Err(e))` — a transport error occurred
    /// - `None` — the connection was closed cleanly by the authority
    ///
    /// # Cancel Safety
    ///
    /// This method **MUST** be cancel-safe (see [trait documentation](Transport)).
    async fn recv(&mut self) -> Option<Result<String, QuizwireError>>;

    /// Close the transport connection gracefully.
    ///
    /// After calling this method, subsequent calls to [`send`](Transport::send)
    /// and [`recv`](Transport::recv) may return errors or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations
    /// should still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), QuizwireError>;
}
