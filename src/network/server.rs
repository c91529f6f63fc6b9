//! TCP Server
//!
//! Accepts broker connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, TrySendError};

use crate::config::Config;
use crate::error::Result;
use crate::shutdown::ShutdownHandle;
use crate::transport::MemoryQueue;

use super::Connection;

/// How often the non-blocking accept loop checks for shutdown
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP broker for a single named queue
pub struct Server {
    config: Config,
    queue: Arc<MemoryQueue>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listener on `config.broker_addr`
    pub fn bind(config: Config, queue: Arc<MemoryQueue>) -> Result<Self> {
        let listener = TcpListener::bind(&config.broker_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            queue,
            listener,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops `run`
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serve until shutdown is triggered (blocking)
    ///
    /// Connections beyond `max_connections` are refused. Connections still
    /// open at shutdown are left to finish on their worker threads.
    pub fn run(&self) -> Result<()> {
        let worker_count = self.config.max_connections;
        let (tx, rx) = channel::bounded::<TcpStream>(worker_count);

        for id in 0..worker_count {
            let rx = rx.clone();
            let queue = Arc::clone(&self.queue);
            let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

            thread::Builder::new()
                .name(format!("broker-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        if let Err(e) = Self::serve(stream, Arc::clone(&queue), read_ms, write_ms) {
                            tracing::debug!("Connection closed with error: {}", e);
                        }
                    }
                })?;
        }

        tracing::info!(
            addr = %self.local_addr()?,
            queue = %self.queue.name(),
            workers = worker_count,
            "Broker listening"
        );

        while !self.shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => match tx.try_send(stream) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(%peer, "Connection limit reached, refusing client");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                },
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!(queue = %self.queue.name(), "Broker stopped accepting connections");
        Ok(())
    }

    fn serve(stream: TcpStream, queue: Arc<MemoryQueue>, read_ms: u64, write_ms: u64) -> Result<()> {
        // Accepted sockets must block regardless of the listener's mode
        stream.set_nonblocking(false)?;
        let mut connection = Connection::new(stream, queue)?;
        connection.set_timeouts(read_ms, write_ms)?;
        connection.handle()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }
}
