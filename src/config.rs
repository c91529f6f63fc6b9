//! Configuration for QueueKV
//!
//! Centralized configuration with sensible defaults, an optional JSON
//! config file, and a builder for programmatic/CLI overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{QueueKvError, Result};

/// Largest batch a single receive call may request
pub const MAX_BATCH_SIZE: usize = 10;

/// Longest long-poll wait a receive call may request
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);

/// Longest time a received message may stay hidden
pub const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

/// Main configuration for a QueueKV process
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Queue Configuration
    // -------------------------------------------------------------------------
    /// Name of the queue carrying commands
    pub queue_name: String,

    /// Message group every producer sends under (FIFO ordering scope)
    pub group_id: String,

    /// Broker address used by the TCP transport (host:port)
    pub broker_addr: String,

    // -------------------------------------------------------------------------
    // Consumer Configuration
    // -------------------------------------------------------------------------
    /// Max messages requested per receive call (1..=10)
    pub batch_size: usize,

    /// How long a received message stays hidden from other consumers
    pub visibility_timeout: Duration,

    /// Long-poll wait for each receive call
    pub wait_time: Duration,

    /// Number of worker threads processing messages concurrently
    pub worker_count: usize,

    /// Pause before retrying a failed receive call
    pub receive_retry_delay: Duration,

    /// How long shutdown waits for in-flight messages
    pub shutdown_timeout: Duration,

    // -------------------------------------------------------------------------
    // Logging Configuration
    // -------------------------------------------------------------------------
    /// Log file (append mode); stderr when unset
    pub log_file: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Broker Configuration
    // -------------------------------------------------------------------------
    /// Journal file for the broker's queue; in-memory only when unset
    pub journal_path: Option<PathBuf>,

    /// Sync strategy: how often to fsync the journal
    pub journal_sync_strategy: WalSyncStrategy,

    /// Max concurrent broker client connections (worker threads)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Journal sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_name: "queuekv.fifo".to_string(),
            group_id: "Allclients".to_string(),
            broker_addr: "127.0.0.1:7070".to_string(),
            batch_size: MAX_BATCH_SIZE,
            visibility_timeout: Duration::from_secs(60),
            wait_time: Duration::from_secs(5),
            worker_count: 8,
            receive_retry_delay: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(30),
            log_file: None,
            journal_path: None,
            journal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            max_connections: 64,
            // Long polls hold a connection idle for up to `wait_time`
            read_timeout_ms: 120_000,
            write_timeout_ms: 5000,
        }
    }
}

/// On-disk shape of the JSON config file
///
/// Only `queueName` is required; everything else falls back to defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    queue_name: String,
    log_file_name: Option<PathBuf>,
    group_id: Option<String>,
    broker_addr: Option<String>,
    batch_size: Option<usize>,
    visibility_timeout_secs: Option<u64>,
    wait_time_secs: Option<u64>,
    worker_count: Option<usize>,
    journal_path: Option<PathBuf>,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a config from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            QueueKvError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), queue = %config.queue_name, "Loaded config file");
        Ok(config)
    }

    /// Parse a config from JSON text and validate it
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: FileConfig = serde_json::from_str(raw)
            .map_err(|e| QueueKvError::Config(format!("invalid config file: {}", e)))?;

        let mut builder = Config::builder().queue_name(file.queue_name);
        if let Some(path) = file.log_file_name {
            builder = builder.log_file(path);
        }
        if let Some(group) = file.group_id {
            builder = builder.group_id(group);
        }
        if let Some(addr) = file.broker_addr {
            builder = builder.broker_addr(addr);
        }
        if let Some(size) = file.batch_size {
            builder = builder.batch_size(size);
        }
        if let Some(secs) = file.visibility_timeout_secs {
            builder = builder.visibility_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = file.wait_time_secs {
            builder = builder.wait_time(Duration::from_secs(secs));
        }
        if let Some(count) = file.worker_count {
            builder = builder.worker_count(count);
        }
        if let Some(path) = file.journal_path {
            builder = builder.journal_path(path);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the consumer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_name.trim().is_empty() {
            return Err(QueueKvError::Config("queue name must not be empty".to_string()));
        }
        if self.group_id.is_empty() {
            return Err(QueueKvError::Config("group id must not be empty".to_string()));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(QueueKvError::Config(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if self.wait_time > MAX_WAIT_TIME {
            return Err(QueueKvError::Config(format!(
                "wait time must be at most {}s, got {}s",
                MAX_WAIT_TIME.as_secs(),
                self.wait_time.as_secs()
            )));
        }
        if self.visibility_timeout > MAX_VISIBILITY_TIMEOUT {
            return Err(QueueKvError::Config(format!(
                "visibility timeout must be at most {}s, got {}s",
                MAX_VISIBILITY_TIMEOUT.as_secs(),
                self.visibility_timeout.as_secs()
            )));
        }
        if self.worker_count == 0 {
            return Err(QueueKvError::Config("worker count must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(QueueKvError::Config("max connections must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the queue name
    pub fn queue_name(mut self, name: impl Into<String>) -> Self {
        self.config.queue_name = name.into();
        self
    }

    /// Set the producer message group
    pub fn group_id(mut self, group: impl Into<String>) -> Self {
        self.config.group_id = group.into();
        self
    }

    /// Set the broker address
    pub fn broker_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.broker_addr = addr.into();
        self
    }

    /// Set the receive batch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the visibility timeout
    pub fn visibility_timeout(mut self, timeout: Duration) -> Self {
        self.config.visibility_timeout = timeout;
        self
    }

    /// Set the long-poll wait time
    pub fn wait_time(mut self, wait: Duration) -> Self {
        self.config.wait_time = wait;
        self
    }

    /// Set the number of worker threads
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// Set the delay before retrying a failed receive
    pub fn receive_retry_delay(mut self, delay: Duration) -> Self {
        self.config.receive_retry_delay = delay;
        self
    }

    /// Set how long shutdown waits for in-flight work
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Set the log file
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    /// Set the broker journal file
    pub fn journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.journal_path = Some(path.into());
        self
    }

    /// Set the journal sync strategy
    pub fn journal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.journal_sync_strategy = strategy;
        self
    }

    /// Set the maximum number of concurrent broker connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
