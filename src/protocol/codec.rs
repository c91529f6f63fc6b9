//! Protocol codec
//!
//! Encoding and decoding functions for broker frames.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! Length is big endian; the payload is the bincode encoding of a
//! `Request` or `Response`.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{QueueKvError, Result};

use super::{Request, Response};

/// Header size: 1 byte kind + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Which side of the exchange a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Request = 0x01,
    Response = 0x02,
}

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

fn encode_frame<T: Serialize>(kind: FrameKind, value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)?;
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(QueueKvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(kind as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);
    Ok(message)
}

/// Parse and validate a header, returning the payload length
fn parse_header(header: &[u8], expected: FrameKind) -> Result<usize> {
    if header.len() < HEADER_SIZE {
        return Err(QueueKvError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            header.len()
        )));
    }

    if header[0] != expected as u8 {
        return Err(QueueKvError::Protocol(format!(
            "Unexpected frame kind: 0x{:02x} (expected 0x{:02x})",
            header[0], expected as u8
        )));
    }

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(QueueKvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    Ok(payload_len as usize)
}

fn decode_frame<T: DeserializeOwned>(bytes: &[u8], expected: FrameKind) -> Result<T> {
    let payload_len = parse_header(bytes, expected)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(QueueKvError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    bincode::deserialize(&bytes[HEADER_SIZE..total_len])
        .map_err(|e| QueueKvError::Protocol(format!("Undecodable payload: {}", e)))
}

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    encode_frame(FrameKind::Request, request)
}

/// Decode a request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    decode_frame(bytes, FrameKind::Request)
}

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    encode_frame(FrameKind::Response, response)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    decode_frame(bytes, FrameKind::Response)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, expected: FrameKind) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = parse_header(&header, expected)?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload_len);
    frame.extend_from_slice(&header);
    frame.resize(HEADER_SIZE + payload_len, 0);
    if payload_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }

    Ok(frame)
}

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let frame = read_frame(reader, FrameKind::Request)?;
    decode_request(&frame)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader, FrameKind::Response)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
