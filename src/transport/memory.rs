//! In-process FIFO queue
//!
//! A `QueueTransport` with FIFO message groups, visibility timeouts,
//! deduplication and long polling. Optionally journaled so the broker can
//! restart without losing unacknowledged messages.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::{WalSyncStrategy, MAX_BATCH_SIZE, MAX_VISIBILITY_TIMEOUT, MAX_WAIT_TIME};
use crate::error::{QueueKvError, Result};
use crate::wal::{Record, WalRecovery, WalWriter};

use super::{Message, QueueTransport, ReceiptHandle};

/// How long a deduplication key suppresses repeat sends
pub const DEDUP_WINDOW: Duration = Duration::from_secs(300);

/// FIFO queue held in memory
///
/// ## Delivery rules
/// - Messages of one group are delivered in enqueue order; while a message
///   of a group is in flight, later messages of that group wait.
/// - A delivered message is hidden until its visibility timeout expires,
///   then redelivered with a new receipt handle.
/// - A repeated deduplication key inside `DEDUP_WINDOW` is accepted but
///   dropped. An empty key disables deduplication for that send.
pub struct MemoryQueue {
    name: String,

    /// Messages and dedup history, guarded together
    state: Mutex<QueueState>,

    /// Signalled on enqueue and delete to wake long polls
    available: Condvar,

    /// Journal (appended before the in-memory state changes)
    journal: Option<Mutex<WalWriter>>,
}

#[derive(Default)]
struct QueueState {
    messages: VecDeque<StoredMessage>,
    dedup: HashMap<String, Instant>,
}

struct StoredMessage {
    message_id: String,
    body: String,
    group_id: String,
    receipt: Option<ReceiptHandle>,
    visible_at: Instant,
    receive_count: u32,
}

impl StoredMessage {
    fn new(message_id: String, body: String, group_id: String, now: Instant) -> Self {
        Self {
            message_id,
            body,
            group_id,
            receipt: None,
            visible_at: now,
            receive_count: 0,
        }
    }
}

impl MemoryQueue {
    /// Create an empty, non-durable queue
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
            journal: None,
        }
    }

    /// Open a journaled queue, recovering unacknowledged messages
    ///
    /// On startup:
    /// 1. Replay the journal (torn tail dropped)
    /// 2. Rebuild the live messages, all visible again
    /// 3. Rewrite the journal with only the live messages
    pub fn open(name: impl Into<String>, path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let name = name.into();
        let (entries, recovery) = WalRecovery::recover(path)?;

        let mut live: Vec<(String, String, String)> = Vec::new();
        for entry in entries {
            match entry.record {
                Record::Enqueued {
                    message_id,
                    body,
                    group_id,
                } => live.push((message_id, body, group_id)),
                Record::Deleted { message_id } => live.retain(|(id, _, _)| *id != message_id),
            }
        }

        if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
            tracing::info!(
                queue = %name,
                recovered = recovery.entries_recovered,
                corrupted = recovery.entries_corrupted,
                last_lsn = recovery.last_lsn,
                last_write_ms = recovery.last_timestamp,
                live = live.len(),
                "Journal recovery complete"
            );
        }

        // Compact: write live messages to a fresh journal, then swap it in
        let compacted = path.with_extension("compact");
        let last_lsn = {
            let mut writer = WalWriter::create(&compacted, WalSyncStrategy::EveryNEntries { count: usize::MAX })?;
            for (message_id, body, group_id) in &live {
                writer.append(Record::Enqueued {
                    message_id: message_id.clone(),
                    body: body.clone(),
                    group_id: group_id.clone(),
                })?;
            }
            writer.sync()?;
            writer.current_lsn()
        };
        fs::rename(&compacted, path)?;

        let now = Instant::now();
        let messages = live
            .into_iter()
            .map(|(id, body, group)| StoredMessage::new(id, body, group, now))
            .collect();

        Ok(Self {
            name,
            state: Mutex::new(QueueState {
                messages,
                dedup: HashMap::new(),
            }),
            available: Condvar::new(),
            journal: Some(Mutex::new(WalWriter::open(path, sync_strategy, last_lsn)?)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Messages not yet deleted (visible or in flight)
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages currently hidden by a visibility timeout
    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        self.state
            .lock()
            .messages
            .iter()
            .filter(|m| m.receipt.is_some() && m.visible_at > now)
            .count()
    }

    fn append_journal(&self, record: Record) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal.lock().append(record)?;
        }
        Ok(())
    }

    /// Take up to `max` deliverable messages, marking them in flight
    fn collect(state: &mut QueueState, max: usize, visibility_timeout: Duration, now: Instant) -> Vec<Message> {
        let mut blocked: HashSet<String> = HashSet::new();
        let mut batch = Vec::new();

        for message in state.messages.iter_mut() {
            if batch.len() >= max {
                break;
            }
            if message.visible_at > now {
                blocked.insert(message.group_id.clone());
                continue;
            }
            if blocked.contains(&message.group_id) {
                continue;
            }

            let receipt = ReceiptHandle::generate();
            message.receipt = Some(receipt.clone());
            message.visible_at = now + visibility_timeout;
            message.receive_count += 1;

            batch.push(Message {
                message_id: message.message_id.clone(),
                body: message.body.clone(),
                receipt_handle: receipt,
                receive_count: message.receive_count,
            });
        }

        batch
    }

    /// Earliest future instant at which a hidden message becomes visible
    fn next_visibility_change(state: &QueueState, now: Instant) -> Option<Instant> {
        state
            .messages
            .iter()
            .map(|m| m.visible_at)
            .filter(|at| *at > now)
            .min()
    }
}

impl QueueTransport for MemoryQueue {
    fn enqueue(&self, body: &str, group_id: &str, dedup_key: &str) -> Result<()> {
        let now = Instant::now();
        let mut state = self.state.lock();

        state
            .dedup
            .retain(|_, seen| now.duration_since(*seen) < DEDUP_WINDOW);
        if !dedup_key.is_empty() && state.dedup.contains_key(dedup_key) {
            tracing::debug!(queue = %self.name, dedup_key, "Dropped duplicate send");
            return Ok(());
        }

        let message_id = uuid::Uuid::new_v4().to_string();
        self.append_journal(Record::Enqueued {
            message_id: message_id.clone(),
            body: body.to_string(),
            group_id: group_id.to_string(),
        })?;

        if !dedup_key.is_empty() {
            state.dedup.insert(dedup_key.to_string(), now);
        }
        state.messages.push_back(StoredMessage::new(
            message_id.clone(),
            body.to_string(),
            group_id.to_string(),
            now,
        ));
        drop(state);

        self.available.notify_all();
        tracing::debug!(queue = %self.name, %message_id, group_id, "Enqueued message");
        Ok(())
    }

    fn receive_batch(
        &self,
        max_messages: usize,
        visibility_timeout: Duration,
        wait: Duration,
    ) -> Result<Vec<Message>> {
        let max = max_messages.clamp(1, MAX_BATCH_SIZE);
        let visibility_timeout = visibility_timeout.min(MAX_VISIBILITY_TIMEOUT);
        let deadline = Instant::now() + wait.min(MAX_WAIT_TIME);
        let mut state = self.state.lock();

        loop {
            let now = Instant::now();
            let batch = Self::collect(&mut state, max, visibility_timeout, now);
            if !batch.is_empty() || now >= deadline {
                if !batch.is_empty() {
                    tracing::trace!(queue = %self.name, count = batch.len(), "Received messages");
                }
                return Ok(batch);
            }

            let wake = Self::next_visibility_change(&state, now)
                .map_or(deadline, |at| at.min(deadline));
            self.available.wait_until(&mut state, wake);
        }
    }

    fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<()> {
        let mut state = self.state.lock();

        let position = state
            .messages
            .iter()
            .position(|m| m.receipt.as_ref() == Some(receipt_handle))
            .ok_or_else(|| QueueKvError::ReceiptNotFound(receipt_handle.to_string()))?;

        let message_id = state.messages[position].message_id.clone();
        self.append_journal(Record::Deleted {
            message_id: message_id.clone(),
        })?;
        state.messages.remove(position);
        drop(state);

        // Deleting may unblock the next message of the same group
        self.available.notify_all();
        tracing::debug!(queue = %self.name, %message_id, "Deleted message");
        Ok(())
    }
}
