//! Broker client transport
//!
//! `QueueTransport` over the broker's TCP protocol.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{QueueKvError, Result};
use crate::protocol::{read_response, write_request, ErrorKind, Request, Response};

use super::{Message, QueueTransport, ReceiptHandle};

/// Idle connections kept for reuse
const MAX_POOLED_CONNECTIONS: usize = 16;

/// Extra read time allowed on top of a long-poll wait
const RESPONSE_GRACE: Duration = Duration::from_secs(10);

/// Client for a queue hosted by the broker
///
/// Keeps a small pool of connections so workers deleting messages are not
/// queued behind a long poll on the receive loop's connection.
pub struct TcpQueue {
    addr: String,
    queue: String,
    pool: Mutex<Vec<ClientConnection>>,
}

struct ClientConnection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl ClientConnection {
    fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| QueueKvError::Transport(format!("cannot connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    fn call(&mut self, request: &Request, read_timeout: Duration) -> Result<Response> {
        self.reader.get_ref().set_read_timeout(Some(read_timeout))?;
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)
    }
}

impl TcpQueue {
    /// Create a client; no connection is made until the first call
    pub fn new(addr: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            queue: queue.into(),
            pool: Mutex::new(Vec::new()),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one request and wait for its response
    fn call(&self, request: Request, read_timeout: Duration) -> Result<Response> {
        self.exchange(&request, read_timeout).map(|(response, _)| response)
    }

    /// Send one request; the flag tells whether it had to be resent
    ///
    /// A pooled connection may have been closed by the broker's idle
    /// timeout, so an I/O failure on one is retried once on a fresh
    /// connection. The first attempt may still have reached the broker.
    fn exchange(&self, request: &Request, read_timeout: Duration) -> Result<(Response, bool)> {
        let pooled = self.pool.lock().pop();

        let (connection, response, resent) = match pooled {
            Some(mut connection) => match connection.call(request, read_timeout) {
                Ok(response) => (connection, response, false),
                Err(QueueKvError::Io(e)) => {
                    tracing::debug!(addr = %self.addr, "Stale pooled connection ({}), reconnecting", e);
                    let mut fresh = ClientConnection::connect(&self.addr)?;
                    let response = fresh.call(request, read_timeout).map_err(Self::transport_error)?;
                    (fresh, response, true)
                }
                Err(e) => return Err(Self::transport_error(e)),
            },
            None => {
                let mut fresh = ClientConnection::connect(&self.addr)?;
                let response = fresh.call(request, read_timeout).map_err(Self::transport_error)?;
                (fresh, response, false)
            }
        };

        {
            let mut pool = self.pool.lock();
            if pool.len() < MAX_POOLED_CONNECTIONS {
                pool.push(connection);
                return Ok((response, resent));
            }
        }
        // Pool is full; let this one close
        let _ = connection.writer.get_ref().shutdown(std::net::Shutdown::Both);
        Ok((response, resent))
    }

    fn transport_error(error: QueueKvError) -> QueueKvError {
        match error {
            QueueKvError::Io(e) => QueueKvError::Transport(e.to_string()),
            other => other,
        }
    }

    fn expect_ok(response: Response) -> Result<()> {
        match response {
            Response::Ok => Ok(()),
            Response::Error { kind, message } => Err(Response::client_error(kind, message)),
            other => Err(QueueKvError::Protocol(format!("unexpected response: {:?}", other))),
        }
    }
}

impl QueueTransport for TcpQueue {
    fn enqueue(&self, body: &str, group_id: &str, dedup_key: &str) -> Result<()> {
        let response = self.call(
            Request::Enqueue {
                queue: self.queue.clone(),
                body: body.to_string(),
                group_id: group_id.to_string(),
                dedup_key: dedup_key.to_string(),
            },
            RESPONSE_GRACE,
        )?;
        Self::expect_ok(response)
    }

    fn receive_batch(
        &self,
        max_messages: usize,
        visibility_timeout: Duration,
        wait: Duration,
    ) -> Result<Vec<Message>> {
        let request = Request::Receive {
            queue: self.queue.clone(),
            max_messages: max_messages.min(u32::MAX as usize) as u32,
            visibility_timeout_secs: visibility_timeout.as_secs().min(u64::from(u32::MAX)) as u32,
            wait_secs: wait.as_secs().min(u64::from(u32::MAX)) as u32,
        };

        match self.call(request, wait.saturating_add(RESPONSE_GRACE))? {
            Response::Messages(messages) => Ok(messages),
            Response::Error { kind, message } => Err(Response::client_error(kind, message)),
            other => Err(QueueKvError::Protocol(format!("unexpected response: {:?}", other))),
        }
    }

    fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<()> {
        let request = Request::Delete {
            queue: self.queue.clone(),
            receipt_handle: receipt_handle.clone(),
        };

        match self.exchange(&request, RESPONSE_GRACE)? {
            // The lost first attempt already removed the message
            (
                Response::Error {
                    kind: ErrorKind::ReceiptNotFound,
                    ..
                },
                true,
            ) => {
                tracing::debug!(%receipt_handle, "Resent delete found no receipt, treating as deleted");
                Ok(())
            }
            (response, _) => Self::expect_ok(response),
        }
    }

    fn probe(&self) -> Result<()> {
        match self.call(Request::Ping { queue: self.queue.clone() }, RESPONSE_GRACE)? {
            Response::Pong => Ok(()),
            Response::Error { kind, message } => Err(Response::client_error(kind, message)),
            other => Err(QueueKvError::Protocol(format!("unexpected response: {:?}", other))),
        }
    }
}
