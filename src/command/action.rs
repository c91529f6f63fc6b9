//! Command definitions
//!
//! Represents commands sent by producers.

use std::fmt;

/// What a command asks the store to do
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    AddItem,
    DeleteItem,
    GetItem,
    GetAllItems,

    /// Any action name the consumer does not recognise (kept for logging)
    Unknown(String),
}

impl Action {
    /// Parse an action name; never fails, unrecognised names become `Unknown`
    pub fn parse(name: &str) -> Self {
        match name {
            "AddItem" => Action::AddItem,
            "DeleteItem" => Action::DeleteItem,
            "GetItem" => Action::GetItem,
            "GetAllItems" => Action::GetAllItems,
            other => Action::Unknown(other.to_string()),
        }
    }

    /// The action name as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Action::AddItem => "AddItem",
            Action::DeleteItem => "DeleteItem",
            Action::GetItem => "GetItem",
            Action::GetAllItems => "GetAllItems",
            Action::Unknown(name) => name,
        }
    }

    /// Whether the action operates on a single key
    pub fn requires_key(&self) -> bool {
        matches!(self, Action::AddItem | Action::DeleteItem | Action::GetItem)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    pub key: String,
    pub value: String,
}

impl Command {
    pub fn new(action: Action, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action,
            key: key.into(),
            value: value.into(),
        }
    }

    /// AddItem command
    pub fn add(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Action::AddItem, key, value)
    }

    /// DeleteItem command
    pub fn delete(key: impl Into<String>) -> Self {
        Self::new(Action::DeleteItem, key, "")
    }

    /// GetItem command
    pub fn get(key: impl Into<String>) -> Self {
        Self::new(Action::GetItem, key, "")
    }

    /// GetAllItems command
    pub fn get_all() -> Self {
        Self::new(Action::GetAllItems, "", "")
    }
}
