//! Error types for the Quizwire client.

use thiserror::Error;

use crate::session::{LifelineBlock, SubmitBlock};

/// Errors that can occur when using the Quizwire client.
#[derive(Debug, Error)]
pub enum QuizwireError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires an active connection, but the
    /// client is not connected.
    #[error("not connected to the session authority")]
    NotConnected,

    /// A submission was blocked by a local pipeline guard before any network
    /// round-trip.
    #[error("submission blocked: {0}")]
    SubmitBlocked(#[from] SubmitBlock),

    /// A lifeline request was blocked by a local pipeline guard before any
    /// network round-trip.
    #[error("lifeline blocked: {0}")]
    LifelineBlocked(#[from] LifelineBlock),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Quizwire client operations.
pub type Result<T> = std::result::Result<T, QuizwireError>;
