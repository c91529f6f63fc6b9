//! Error types for QueueKV
//!
//! Provides a unified error type for all operations.
//!
//! Only transport and configuration errors influence process-level control
//! flow. Decode errors and "key not found" outcomes stay inside the task
//! that processes a single message.

use thiserror::Error;

/// Result type alias using QueueKvError
pub type Result<T> = std::result::Result<T, QueueKvError>;

/// Unified error type for QueueKV operations
#[derive(Debug, Error)]
pub enum QueueKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Receipt handle not found: {0}")]
    ReceiptNotFound(String),

    #[error("Queue does not exist: {0}")]
    QueueNotFound(String),

    // -------------------------------------------------------------------------
    // Message Body Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Broker Protocol / Journal Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueKvError {
    /// Whether the error came from the queue transport layer
    ///
    /// The consumer's receive loop retries these instead of giving up.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            QueueKvError::Io(_)
                | QueueKvError::Transport(_)
                | QueueKvError::ReceiptNotFound(_)
                | QueueKvError::Protocol(_)
        )
    }
}

impl From<bincode::Error> for QueueKvError {
    fn from(e: bincode::Error) -> Self {
        QueueKvError::Serialization(e.to_string())
    }
}

/// Failure to turn a message body into a command
///
/// Malformed bodies are permanent failures: the message is logged and
/// acknowledged, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A comma-separated segment did not split into exactly `name: value`
    #[error("malformed field: {0:?}")]
    MalformedField(String),

    /// No (non-empty) `Action` field was present
    #[error("missing Action field")]
    MissingAction,
}
