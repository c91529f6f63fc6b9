//! Command Module
//!
//! The commands carried in queue message bodies and their text codec.
//!
//! ## Message Body Format
//! ```text
//! Action: <action>, Key: <key>, Value: <value>
//! ```
//!
//! - Comma-separated `Name: Value` pairs, whitespace around both trimmed
//! - Fields may appear in any order; unknown names are ignored
//! - `Value` may be empty or omitted entirely
//!
//! ### Actions
//! - AddItem:     Key + Value
//! - DeleteItem:  Key
//! - GetItem:     Key
//! - GetAllItems: no fields

mod action;
mod codec;

pub use action::{Action, Command};
pub use codec::{decode, encode, encode_command};
