//! Connection Handler
//!
//! Handles individual broker client connections.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MAX_WAIT_TIME;
use crate::error::{QueueKvError, Result};
use crate::protocol::{read_request, write_response, Request, Response};
use crate::transport::{MemoryQueue, QueueTransport};

/// Longest long-poll a client may ask for
pub const MAX_WAIT_SECS: u32 = MAX_WAIT_TIME.as_secs() as u32;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// The hosted queue
    queue: Arc<MemoryQueue>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, queue: Arc<MemoryQueue>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            queue,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends responses.
    /// Returns when the client disconnects, idles past the read timeout, or
    /// an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match read_request(&mut self.reader) {
                Ok(request) => request,
                Err(QueueKvError::Io(ref e)) => match e.kind() {
                    std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted => {
                        tracing::debug!("Client {} disconnected", self.peer_addr);
                        return Ok(());
                    }
                    // Read timeout (Windows uses TimedOut instead of WouldBlock)
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                        tracing::debug!("Idle timeout for client {}", self.peer_addr);
                        return Ok(());
                    }
                    _ => {
                        tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                        return Ok(());
                    }
                },
                Err(e) => {
                    tracing::warn!("Bad request from {}: {}", self.peer_addr, e);
                    let _ = write_response(&mut self.writer, &Response::from_error(&e));
                    return Err(e);
                }
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let response = self.execute_request(request);

            if let Err(e) = write_response(&mut self.writer, &response) {
                // The client may have gone away mid long-poll; messages it
                // was about to receive reappear after their visibility timeout
                if let QueueKvError::Io(ref io_err) = e {
                    match io_err.kind() {
                        std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before response could be sent: {}",
                                self.peer_addr,
                                e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a request against the queue
    fn execute_request(&self, request: Request) -> Response {
        if request.queue() != self.queue.name() {
            return Response::from_error(&QueueKvError::QueueNotFound(request.queue().to_string()));
        }

        let result = match request {
            Request::Enqueue {
                body,
                group_id,
                dedup_key,
                ..
            } => self
                .queue
                .enqueue(&body, &group_id, &dedup_key)
                .map(|()| Response::Ok),
            Request::Receive {
                max_messages,
                visibility_timeout_secs,
                wait_secs,
                ..
            } => self
                .queue
                .receive_batch(
                    max_messages as usize,
                    Duration::from_secs(u64::from(visibility_timeout_secs)),
                    Duration::from_secs(u64::from(wait_secs.min(MAX_WAIT_SECS))),
                )
                .map(Response::Messages),
            Request::Delete { receipt_handle, .. } => {
                self.queue.delete(&receipt_handle).map(|()| Response::Ok)
            }
            Request::Ping { .. } => Ok(Response::Pong),
        };

        result.unwrap_or_else(|e| {
            tracing::debug!("Request from {} failed: {}", self.peer_addr, e);
            Response::from_error(&e)
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
