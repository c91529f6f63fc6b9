//! Engine Module
//!
//! The consumer engine: drains the command queue into the ordered store.
//!
//! ## Responsibilities
//! - Long-poll the queue for batches of messages
//! - Fan messages out to a bounded pool of worker threads
//! - Decode, run the handler, acknowledge (delete) every message
//! - Drain in-flight work on shutdown
//!
//! ## Message lifecycle
//! ```text
//! Received ─► Parsing ─┬─► Dispatched ──► Acknowledged
//!                      └─► ParseFailed ─► Acknowledged
//! ```
//! Malformed bodies are permanent failures and are acknowledged like any
//! other message. Only a failed delete leaves a message on the queue; it
//! comes back after its visibility timeout (at-least-once delivery).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};

use crate::command::decode;
use crate::config::Config;
use crate::error::{DecodeError, Result};
use crate::handler::{self, Outcome};
use crate::shutdown::ShutdownHandle;
use crate::store::OrderedStore;
use crate::transport::{Message, QueueTransport};

/// Slice used when sleeping so shutdown is noticed promptly
const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// What processing did with a message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Body decoded and the handler ran
    Handled(Outcome),

    /// Body could not be decoded
    ParseFailed(DecodeError),
}

/// Report for one processed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessage {
    pub message_id: String,
    pub disposition: Disposition,

    /// Whether the delete (acknowledgement) succeeded
    pub acknowledged: bool,
}

/// Running counters for a consumer
#[derive(Debug, Default)]
pub struct ConsumerStats {
    received: AtomicU64,
    handled: AtomicU64,
    parse_failures: AtomicU64,
    acknowledged: AtomicU64,
    ack_failures: AtomicU64,
    receive_errors: AtomicU64,
}

/// Point-in-time copy of `ConsumerStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub handled: u64,
    pub parse_failures: u64,
    pub acknowledged: u64,
    pub ack_failures: u64,
    pub receive_errors: u64,
}

impl StatsSnapshot {
    /// Messages whose processing attempt finished (acknowledged or not)
    pub fn processed(&self) -> u64 {
        self.handled + self.parse_failures
    }
}

impl ConsumerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
        }
    }

    fn record(&self, report: &ProcessedMessage) {
        match report.disposition {
            Disposition::Handled(_) => self.handled.fetch_add(1, Ordering::Relaxed),
            Disposition::ParseFailed(_) => self.parse_failures.fetch_add(1, Ordering::Relaxed),
        };
        if report.acknowledged {
            self.acknowledged.fetch_add(1, Ordering::Relaxed);
        } else {
            self.ack_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Process one message: decode, handle, acknowledge
///
/// The message is deleted whatever the decode or handler result was.
pub fn process_message(
    transport: &dyn QueueTransport,
    store: &OrderedStore,
    message: Message,
) -> ProcessedMessage {
    tracing::debug!(
        message_id = %message.message_id,
        receive_count = message.receive_count,
        "Processing message"
    );

    let disposition = match decode(&message.body) {
        Ok(command) => Disposition::Handled(handler::handle(store, &command)),
        Err(e) => {
            tracing::warn!(
                message_id = %message.message_id,
                body = %message.body,
                "Failed to parse message body: {}",
                e
            );
            Disposition::ParseFailed(e)
        }
    };

    let acknowledged = match transport.delete(&message.receipt_handle) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                message_id = %message.message_id,
                "Failed to delete message from queue, it will be redelivered: {}",
                e
            );
            false
        }
    };

    ProcessedMessage {
        message_id: message.message_id,
        disposition,
        acknowledged,
    }
}

/// Queue consumer applying commands to an ordered store
///
/// ## Concurrency Model
///
/// - One receive loop (the thread calling `run`)
/// - `worker_count` worker threads fed through a bounded channel; when all
///   workers are busy and the channel is full the receive loop blocks, so
///   at most `2 * worker_count` messages are held at once
/// - The store's own lock serialises every store access
///
/// Messages handled by different workers have no ordering relative to each
/// other. Two AddItem commands for the same key received together apply in
/// whichever order their workers take the store lock: last writer (by
/// processing time, not send time) wins.
pub struct Consumer {
    config: Config,
    transport: Arc<dyn QueueTransport>,
    store: Arc<OrderedStore>,
    stats: Arc<ConsumerStats>,
    shutdown: ShutdownHandle,
    outcome_sink: Option<Sender<ProcessedMessage>>,
}

impl Consumer {
    /// Create a consumer with an empty store
    pub fn new(config: Config, transport: Arc<dyn QueueTransport>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            transport,
            store: Arc::new(OrderedStore::new()),
            stats: Arc::new(ConsumerStats::default()),
            shutdown: ShutdownHandle::new(),
            outcome_sink: None,
        })
    }

    /// Use an existing store
    pub fn with_store(mut self, store: Arc<OrderedStore>) -> Self {
        self.store = store;
        self
    }

    /// Report every processed message on a channel
    pub fn with_outcome_sink(mut self, sink: Sender<ProcessedMessage>) -> Self {
        self.outcome_sink = Some(sink);
        self
    }

    /// Run until shutdown is triggered (blocking)
    ///
    /// On shutdown, messages already received are still processed; the
    /// call returns once workers finish or `shutdown_timeout` elapses.
    pub fn run(&self) -> Result<()> {
        let worker_count = self.config.worker_count;
        let (task_tx, task_rx) = channel::bounded::<Message>(worker_count);
        let (done_tx, done_rx) = channel::unbounded::<()>();

        for id in 0..worker_count {
            let task_rx = task_rx.clone();
            let done_tx = done_tx.clone();
            let transport = Arc::clone(&self.transport);
            let store = Arc::clone(&self.store);
            let stats = Arc::clone(&self.stats);
            let sink = self.outcome_sink.clone();

            thread::Builder::new()
                .name(format!("consumer-worker-{}", id))
                .spawn(move || {
                    for message in task_rx.iter() {
                        let report = process_message(transport.as_ref(), &store, message);
                        stats.record(&report);
                        if let Some(sink) = &sink {
                            let _ = sink.send(report);
                        }
                    }
                    let _ = done_tx.send(());
                })?;
        }
        drop(done_tx);

        tracing::info!(
            workers = worker_count,
            batch_size = self.config.batch_size,
            visibility_timeout_secs = self.config.visibility_timeout.as_secs(),
            wait_secs = self.config.wait_time.as_secs(),
            "Consumer started"
        );

        'receive: while !self.shutdown.is_triggered() {
            let batch = match self.transport.receive_batch(
                self.config.batch_size,
                self.config.visibility_timeout,
                self.config.wait_time,
            ) {
                Ok(batch) => batch,
                Err(e) => {
                    self.stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                    if e.is_transport() {
                        tracing::warn!("Failed to receive messages, retrying: {}", e);
                    } else {
                        tracing::error!("Unexpected error receiving messages, retrying: {}", e);
                    }
                    self.pause(self.config.receive_retry_delay);
                    continue;
                }
            };

            for message in batch {
                self.stats.received.fetch_add(1, Ordering::Relaxed);
                // Blocks while every worker is busy
                if task_tx.send(message).is_err() {
                    tracing::error!("All consumer workers exited");
                    break 'receive;
                }
            }
        }

        drop(task_tx);
        self.drain(worker_count, &done_rx);
        Ok(())
    }

    /// Wait for workers to finish queued and in-flight messages
    fn drain(&self, worker_count: usize, done_rx: &channel::Receiver<()>) {
        tracing::info!("Consumer stopping, waiting for in-flight messages");
        let deadline = Instant::now() + self.config.shutdown_timeout;

        let mut finished = 0;
        while finished < worker_count {
            match done_rx.recv_deadline(deadline) {
                Ok(()) => finished += 1,
                Err(_) => break,
            }
        }

        if finished < worker_count {
            tracing::warn!(
                busy_workers = worker_count - finished,
                "Shutdown timed out; unacknowledged messages will be redelivered"
            );
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            received = stats.received,
            handled = stats.handled,
            parse_failures = stats.parse_failures,
            ack_failures = stats.ack_failures,
            "Consumer stopped"
        );
    }

    /// Sleep for `duration`, waking early on shutdown
    fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.shutdown.is_triggered() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Handle that stops `run`
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// The store commands are applied to
    pub fn store(&self) -> Arc<OrderedStore> {
        Arc::clone(&self.store)
    }

    /// Running counters
    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
