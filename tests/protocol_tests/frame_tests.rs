//! Frame Tests
//!
//! Tests for broker request/response framing.

use std::io::Cursor;

use queuekv::protocol::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, ErrorKind, FrameKind, Request, Response,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use queuekv::transport::{Message, ReceiptHandle};
use queuekv::QueueKvError;

fn sample_message() -> Message {
    Message {
        message_id: "m-1".to_string(),
        body: "Action: AddItem, Key: k1, Value: v1".to_string(),
        receipt_handle: ReceiptHandle::new("r-1"),
        receive_count: 1,
    }
}

// =============================================================================
// Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_request_header() {
    let bytes = encode_request(&Request::Ping { queue: "q".to_string() }).unwrap();

    assert_eq!(bytes[0], FrameKind::Request as u8);
    let len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    assert_eq!(bytes.len(), HEADER_SIZE + len);
}

#[test]
fn test_receive_request_decodes() {
    let request = Request::Receive {
        queue: "q".to_string(),
        max_messages: 10,
        visibility_timeout_secs: 60,
        wait_secs: 5,
    };

    let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();
    assert_eq!(decoded, request);
    assert_eq!(decoded.queue(), "q");
}

#[test]
fn test_messages_response_decodes() {
    let response = Response::Messages(vec![sample_message()]);
    let decoded = decode_response(&encode_response(&response).unwrap()).unwrap();
    assert_eq!(decoded, response);
}

#[test]
fn test_error_response_maps_to_client_error() {
    let response = Response::from_error(&QueueKvError::QueueNotFound("other".to_string()));
    let decoded = decode_response(&encode_response(&response).unwrap()).unwrap();

    match decoded {
        Response::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::QueueNotFound);
            assert!(matches!(
                Response::client_error(kind, message),
                QueueKvError::QueueNotFound(_)
            ));
        }
        other => panic!("Expected ERROR response, got {:?}", other),
    }
}

// =============================================================================
// Malformed Frame Tests
// =============================================================================

#[test]
fn test_decode_incomplete_header() {
    let result = decode_request(&[0x01, 0x00]);
    assert!(matches!(result, Err(QueueKvError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_payload() {
    let bytes = encode_request(&Request::Ping { queue: "queue".to_string() }).unwrap();
    let result = decode_request(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(QueueKvError::Protocol(_))));
}

#[test]
fn test_decode_wrong_frame_kind() {
    let bytes = encode_response(&Response::Ok).unwrap();
    let result = decode_request(&bytes);
    assert!(matches!(result, Err(QueueKvError::Protocol(_))));
}

#[test]
fn test_decode_oversized_length() {
    let mut bytes = vec![FrameKind::Request as u8];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());
    let result = decode_request(&bytes);
    assert!(matches!(result, Err(QueueKvError::Protocol(_))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_requests() {
    let requests = vec![
        Request::Enqueue {
            queue: "q".to_string(),
            body: "Action: GetAllItems".to_string(),
            group_id: "Allclients".to_string(),
            dedup_key: "abc".to_string(),
        },
        Request::Delete {
            queue: "q".to_string(),
            receipt_handle: ReceiptHandle::new("r"),
        },
    ];

    let mut buffer = Vec::new();
    for request in &requests {
        write_request(&mut buffer, request).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for request in &requests {
        assert_eq!(&read_request(&mut cursor).unwrap(), request);
    }
    assert!(matches!(read_request(&mut cursor), Err(QueueKvError::Io(_))));
}

#[test]
fn test_stream_response() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::Pong).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_response(&mut cursor).unwrap(), Response::Pong);
}
