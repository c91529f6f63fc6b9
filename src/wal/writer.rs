//! WAL Writer
//!
//! Handles appending entries to the journal file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::{Record, WalEntry};

/// Writes entries to the journal file
pub struct WalWriter {
    /// Journal location (for logging)
    path: PathBuf,

    /// Buffered append handle
    writer: BufWriter<File>,

    /// LSN of the last entry written (0 = none)
    current_lsn: u64,

    /// When to fsync
    sync_strategy: WalSyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open a journal for appending, continuing after `last_lsn`
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_file(path, file, sync_strategy, last_lsn))
    }

    /// Create (or truncate) a journal and start at LSN 1
    pub fn create(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::from_file(path, file, sync_strategy, 0))
    }

    fn from_file(path: &Path, file: File, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: last_lsn,
            sync_strategy,
            unsynced: 0,
        }
    }

    /// Append a record, returning its LSN
    ///
    /// The entry is flushed to the OS before returning; fsync follows the
    /// configured sync strategy.
    pub fn append(&mut self, record: Record) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let bytes = WalEntry::new(lsn, record).encode()?;

        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        self.current_lsn = lsn;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count.max(1),
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        tracing::trace!(path = %self.path.display(), lsn = self.current_lsn, "Journal synced");
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }
}
