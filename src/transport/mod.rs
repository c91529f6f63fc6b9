//! Transport Module
//!
//! The queue contract the consumer and producer are written against, plus
//! two implementations of it.
//!
//! ## Contract
//! - `enqueue(body, group_id, dedup_key)`
//! - `receive_batch(max_messages, visibility_timeout, wait)`
//! - `delete(receipt_handle)`
//!
//! Delivery is at-least-once: a received message stays hidden for the
//! visibility timeout and comes back (with a new receipt handle) unless it
//! is deleted first.
//!
//! ## Implementations
//! - `MemoryQueue`: in-process FIFO queue, optionally journaled
//! - `TcpQueue`: client for a `MemoryQueue` hosted by the broker

mod memory;
mod remote;

pub use memory::{MemoryQueue, DEDUP_WINDOW};
pub use remote::TcpQueue;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque token that acknowledges one delivery of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Fresh random handle
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message as delivered to a consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable id assigned at enqueue time
    pub message_id: String,

    /// Textual body (an encoded command)
    pub body: String,

    /// Capability to delete this delivery
    pub receipt_handle: ReceiptHandle,

    /// How many times the message has been delivered, this one included
    pub receive_count: u32,
}

/// Durable at-least-once FIFO queue
pub trait QueueTransport: Send + Sync {
    /// Append a message to the queue under a message group
    fn enqueue(&self, body: &str, group_id: &str, dedup_key: &str) -> Result<()>;

    /// Receive up to `max_messages`, hiding them for `visibility_timeout`
    ///
    /// Blocks up to `wait` when nothing is deliverable; may return empty.
    fn receive_batch(
        &self,
        max_messages: usize,
        visibility_timeout: Duration,
        wait: Duration,
    ) -> Result<Vec<Message>>;

    /// Permanently remove a received message
    fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<()>;

    /// Check the queue is reachable
    fn probe(&self) -> Result<()> {
        Ok(())
    }
}
