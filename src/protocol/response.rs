//! Response definitions
//!
//! Represents responses to queue clients.

use serde::{Deserialize, Serialize};

use crate::error::QueueKvError;
use crate::transport::Message;

/// Error categories a client can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    QueueNotFound,
    ReceiptNotFound,
    Internal,
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Enqueue/Delete succeeded
    Ok,

    /// Result of a Receive (possibly empty)
    Messages(Vec<Message>),

    /// Reply to Ping
    Pong,

    /// Request failed
    Error { kind: ErrorKind, message: String },
}

impl Response {
    /// Build the ERROR response for a failed queue operation
    pub fn from_error(error: &QueueKvError) -> Self {
        let kind = match error {
            QueueKvError::QueueNotFound(_) => ErrorKind::QueueNotFound,
            QueueKvError::ReceiptNotFound(_) => ErrorKind::ReceiptNotFound,
            _ => ErrorKind::Internal,
        };
        Response::Error {
            kind,
            message: error.to_string(),
        }
    }

    /// Turn an ERROR response back into the matching client-side error
    pub fn client_error(kind: ErrorKind, message: String) -> QueueKvError {
        match kind {
            ErrorKind::QueueNotFound => QueueKvError::QueueNotFound(message),
            ErrorKind::ReceiptNotFound => QueueKvError::ReceiptNotFound(message),
            ErrorKind::Internal => QueueKvError::Transport(message),
        }
    }
}
