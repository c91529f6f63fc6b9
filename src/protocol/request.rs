//! Request definitions
//!
//! Represents requests from queue clients.

use serde::{Deserialize, Serialize};

use crate::transport::ReceiptHandle;

/// A request to the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Append a message
    Enqueue {
        queue: String,
        body: String,
        group_id: String,
        dedup_key: String,
    },

    /// Receive a batch (long poll)
    Receive {
        queue: String,
        max_messages: u32,
        visibility_timeout_secs: u32,
        wait_secs: u32,
    },

    /// Acknowledge a delivery
    Delete {
        queue: String,
        receipt_handle: ReceiptHandle,
    },

    /// Health check, also confirms the queue exists
    Ping { queue: String },
}

impl Request {
    /// The queue this request targets
    pub fn queue(&self) -> &str {
        match self {
            Request::Enqueue { queue, .. }
            | Request::Receive { queue, .. }
            | Request::Delete { queue, .. }
            | Request::Ping { queue } => queue,
        }
    }
}
