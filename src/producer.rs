//! Producer
//!
//! Client side of the store: validates input, encodes commands and sends
//! them to the queue. Fire-and-forget; results only show up in the
//! consumer's log.

use std::sync::Arc;

use crate::command::{encode, Action};
use crate::error::{QueueKvError, Result};
use crate::transport::QueueTransport;

/// Whether a key or value is acceptable to send (ASCII alphanumerics only)
///
/// Empty input passes; callers decide whether a field may be empty.
pub fn is_valid_input(input: &str) -> bool {
    input.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Check an action/key/value triple before it is sent
pub fn validate(action: &Action, key: &str, value: &str) -> Result<()> {
    if let Action::Unknown(name) = action {
        return Err(QueueKvError::InvalidInput(format!("unknown action {:?}", name)));
    }
    if action.requires_key() && key.is_empty() {
        return Err(QueueKvError::InvalidInput("key cannot be empty".to_string()));
    }
    if !is_valid_input(key) {
        return Err(QueueKvError::InvalidInput(
            "key must contain only alphanumeric characters".to_string(),
        ));
    }
    if !is_valid_input(value) {
        return Err(QueueKvError::InvalidInput(
            "value must contain only alphanumeric characters".to_string(),
        ));
    }
    Ok(())
}

/// Fresh deduplication key; every send is unique even for identical bodies
pub fn generate_dedup_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Sends commands to the queue
pub struct Producer {
    transport: Arc<dyn QueueTransport>,
    group_id: String,
}

impl Producer {
    pub fn new(transport: Arc<dyn QueueTransport>, group_id: impl Into<String>) -> Self {
        Self {
            transport,
            group_id: group_id.into(),
        }
    }

    /// Validate, encode and enqueue a command
    pub fn send(&self, action: Action, key: &str, value: &str) -> Result<()> {
        validate(&action, key, value)?;

        // Only AddItem carries a value, GetAllItems carries nothing
        let key = if action.requires_key() { key } else { "" };
        let value = if action == Action::AddItem { value } else { "" };
        let body = encode(&action, key, value);
        let dedup_key = generate_dedup_key();

        self.transport.enqueue(&body, &self.group_id, &dedup_key)?;
        tracing::debug!(%action, key, %dedup_key, "Sent message to queue");
        Ok(())
    }

    pub fn add_item(&self, key: &str, value: &str) -> Result<()> {
        self.send(Action::AddItem, key, value)
    }

    pub fn delete_item(&self, key: &str) -> Result<()> {
        self.send(Action::DeleteItem, key, "")
    }

    pub fn get_item(&self, key: &str) -> Result<()> {
        self.send(Action::GetItem, key, "")
    }

    pub fn get_all_items(&self) -> Result<()> {
        self.send(Action::GetAllItems, "", "")
    }
}
