//! Command Handlers
//!
//! Apply one decoded command to the ordered store and log what happened.
//!
//! Handlers never fail: "key not found" and rejected input are outcomes,
//! logged and returned, never errors. The message that carried the command
//! is acknowledged either way.

use crate::command::{Action, Command};
use crate::store::OrderedStore;

/// What a handler did with a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// AddItem on a new key
    Added { key: String, value: String },

    /// AddItem on an existing key
    Overwritten {
        key: String,
        old_value: String,
        new_value: String,
    },

    /// DeleteItem removed the key
    Deleted { key: String },

    /// GetItem found the key
    Found { key: String, value: String },

    /// DeleteItem/GetItem on an absent key
    NotFound { action: Action, key: String },

    /// GetAllItems, entries in insertion order
    Listed(Vec<(String, String)>),

    /// A keyed action whose key failed validation
    Rejected { action: Action, reason: String },

    /// Action name not recognised
    Unknown { action: String },
}

/// Whether a key is acceptable for a keyed action
///
/// Producers only send non-empty ASCII alphanumeric keys; anything else
/// reaching the consumer is treated as untrusted input.
pub fn is_well_formed_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Run the handler for a command's action
pub fn handle(store: &OrderedStore, command: &Command) -> Outcome {
    if command.action.requires_key() && !is_well_formed_key(&command.key) {
        let reason = if command.key.is_empty() {
            "missing key".to_string()
        } else {
            format!("key {:?} is not alphanumeric", command.key)
        };
        tracing::warn!(action = %command.action, %reason, "Rejected command");
        return Outcome::Rejected {
            action: command.action.clone(),
            reason,
        };
    }

    match &command.action {
        Action::AddItem => add_item(store, &command.key, &command.value),
        Action::DeleteItem => delete_item(store, &command.key),
        Action::GetItem => get_item(store, &command.key),
        Action::GetAllItems => get_all_items(store),
        Action::Unknown(name) => {
            tracing::warn!(action = %name, "Unknown action");
            Outcome::Unknown {
                action: name.clone(),
            }
        }
    }
}

fn add_item(store: &OrderedStore, key: &str, value: &str) -> Outcome {
    let result = store.add(key, value);

    match result.previous {
        Some(old_value) => {
            tracing::info!(
                "AddItem - Key: {} already exists. Overwriting value. Old value: {}, New value: {}",
                key,
                old_value,
                value
            );
            Outcome::Overwritten {
                key: key.to_string(),
                old_value,
                new_value: value.to_string(),
            }
        }
        None => {
            tracing::info!("AddItem - Key: {}, Value: {}", key, value);
            Outcome::Added {
                key: key.to_string(),
                value: value.to_string(),
            }
        }
    }
}

fn delete_item(store: &OrderedStore, key: &str) -> Outcome {
    if store.delete(key) {
        tracing::info!("DeleteItem - Key: {}", key);
        Outcome::Deleted {
            key: key.to_string(),
        }
    } else {
        tracing::info!("DeleteItem - Key does not exist: {}", key);
        Outcome::NotFound {
            action: Action::DeleteItem,
            key: key.to_string(),
        }
    }
}

fn get_item(store: &OrderedStore, key: &str) -> Outcome {
    match store.get(key) {
        Some(value) => {
            tracing::info!("GetItem - Key: {}, Value: {}", key, value);
            Outcome::Found {
                key: key.to_string(),
                value,
            }
        }
        None => {
            tracing::info!("GetItem - Key does not exist: {}", key);
            Outcome::NotFound {
                action: Action::GetItem,
                key: key.to_string(),
            }
        }
    }
}

fn get_all_items(store: &OrderedStore) -> Outcome {
    let entries = store.snapshot();

    tracing::info!(count = entries.len(), "GetAllItems");
    for (key, value) in &entries {
        tracing::info!("Key: {}, Value: {}", key, value);
    }

    Outcome::Listed(entries)
}
