//! Codec Tests
//!
//! Tests for message body encoding/decoding.

use queuekv::command::{decode, encode, encode_command, Action, Command};
use queuekv::DecodeError;

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_add_item() {
    let body = encode(&Action::AddItem, "k1", "v1");
    assert_eq!(body, "Action: AddItem, Key: k1, Value: v1");
}

#[test]
fn test_encode_get_all_items_has_empty_fields() {
    let body = encode_command(&Command::get_all());
    assert_eq!(body, "Action: GetAllItems, Key: , Value: ");
}

#[test]
fn test_encode_is_deterministic() {
    let cmd = Command::add("abc", "123");
    assert_eq!(encode_command(&cmd), encode_command(&cmd));
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_all_actions() {
    let cases = vec![
        Command::add("key1", "value1"),
        Command::delete("key1"),
        Command::get("key1"),
        Command::get_all(),
        Command::new(Action::Unknown("Frobnicate".to_string()), "k", "v"),
    ];

    for cmd in cases {
        let decoded = decode(&encode_command(&cmd)).unwrap();
        assert_eq!(decoded, cmd);
    }
}

#[test]
fn test_round_trip_empty_value() {
    let cmd = Command::add("key", "");
    assert_eq!(decode(&encode_command(&cmd)).unwrap(), cmd);
}

#[test]
fn test_round_trip_empty_key() {
    let cmd = Command::new(Action::GetItem, "", "");
    assert_eq!(decode(&encode_command(&cmd)).unwrap(), cmd);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_fields_in_any_order() {
    let cmd = decode("Value: v9, Key: k9, Action: AddItem").unwrap();
    assert_eq!(cmd, Command::add("k9", "v9"));
}

#[test]
fn test_decode_value_omitted() {
    let cmd = decode("Action: DeleteItem, Key: gone").unwrap();
    assert_eq!(cmd, Command::delete("gone"));
}

#[test]
fn test_decode_action_only() {
    let cmd = decode("Action: GetAllItems").unwrap();
    assert_eq!(cmd, Command::get_all());
}

#[test]
fn test_decode_trims_whitespace() {
    let cmd = decode("  Action :  GetItem ,Key:abc  ").unwrap();
    assert_eq!(cmd, Command::get("abc"));
}

#[test]
fn test_decode_ignores_unknown_fields() {
    let cmd = decode("Action: AddItem, Key: k, Value: v, Priority: high").unwrap();
    assert_eq!(cmd, Command::add("k", "v"));
}

#[test]
fn test_decode_unknown_action() {
    let cmd = decode("Action: Explode, Key: k").unwrap();
    assert_eq!(cmd.action, Action::Unknown("Explode".to_string()));
    assert_eq!(cmd.action.to_string(), "Explode");
}

#[test]
fn test_decode_is_pure() {
    let body = "Action: AddItem, Key: same, Value: body";
    assert_eq!(decode(body), decode(body));
    assert_eq!(decode("Key: abc"), decode("Key: abc"));
}

// =============================================================================
// Decode Error Tests
// =============================================================================

#[test]
fn test_decode_missing_action() {
    assert_eq!(decode("Key: abc"), Err(DecodeError::MissingAction));
}

#[test]
fn test_decode_empty_action_is_missing() {
    assert_eq!(
        decode("Action: , Key: abc, Value: x"),
        Err(DecodeError::MissingAction)
    );
}

#[test]
fn test_decode_segment_without_separator() {
    let result = decode("Action: AddItem, garbage");
    assert_eq!(
        result,
        Err(DecodeError::MalformedField(" garbage".to_string()))
    );
}

#[test]
fn test_decode_segment_with_two_separators() {
    let result = decode("Action: AddItem, Key: a:b");
    assert!(matches!(result, Err(DecodeError::MalformedField(_))));
}

#[test]
fn test_decode_empty_body() {
    assert!(matches!(decode(""), Err(DecodeError::MalformedField(_))));
}

#[test]
fn test_decode_trailing_comma() {
    let result = decode("Action: GetAllItems,");
    assert!(matches!(result, Err(DecodeError::MalformedField(_))));
}
