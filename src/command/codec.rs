//! Message body codec
//!
//! Encoding and decoding of commands to and from the textual queue body.
//!
//! The producer restricts keys and values to ASCII alphanumerics, so the
//! `,` and `:` delimiters can never appear inside a field. The decoder does
//! not rely on that: any segment that does not split into exactly one name
//! and one value is rejected.

use crate::error::DecodeError;

use super::{Action, Command};

/// Separator between `Name: Value` pairs
const FIELD_SEPARATOR: char = ',';

/// Separator between a field name and its value
const NAME_SEPARATOR: char = ':';

/// Encode an action/key/value triple into a message body
///
/// Format: `Action: <action>, Key: <key>, Value: <value>`
pub fn encode(action: &Action, key: &str, value: &str) -> String {
    format!("Action: {}, Key: {}, Value: {}", action, key, value)
}

/// Encode a command into a message body
pub fn encode_command(command: &Command) -> String {
    encode(&command.action, &command.key, &command.value)
}

/// Decode a message body into a command
///
/// Fields may come in any order, unknown field names are ignored, and a
/// missing `Key`/`Value` decodes as an empty string.
pub fn decode(body: &str) -> Result<Command, DecodeError> {
    let mut action: Option<Action> = None;
    let mut key = String::new();
    let mut value = String::new();

    for segment in body.split(FIELD_SEPARATOR) {
        let mut parts = segment.split(NAME_SEPARATOR);
        let (name, field_value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(field_value), None) => (name.trim(), field_value.trim()),
            _ => return Err(DecodeError::MalformedField(segment.to_string())),
        };

        match name {
            "Action" => {
                action = if field_value.is_empty() {
                    None
                } else {
                    Some(Action::parse(field_value))
                };
            }
            "Key" => key = field_value.to_string(),
            "Value" => value = field_value.to_string(),
            _ => {}
        }
    }

    let action = action.ok_or(DecodeError::MissingAction)?;
    Ok(Command { action, key, value })
}
