//! Protocol Module
//!
//! Defines the wire protocol between the broker and `TcpQueue` clients.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │     Payload (bincode)       │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Frame Kinds
//! - 0x01: REQUEST  - Payload: `Request`
//! - 0x02: RESPONSE - Payload: `Response`
//!
//! ### Requests
//! - Enqueue { queue, body, group_id, dedup_key }
//! - Receive { queue, max_messages, visibility_timeout_secs, wait_secs }
//! - Delete  { queue, receipt_handle }
//! - Ping    { queue }
//!
//! Every request names its queue so a client pointed at the wrong broker
//! fails loudly instead of silently talking to another queue.

mod request;
mod response;
mod codec;

pub use request::Request;
pub use response::{ErrorKind, Response};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, FrameKind, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
