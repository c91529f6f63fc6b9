//! WAL Recovery
//!
//! Reads back a journal after a restart or crash.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{QueueKvError, Result};

use super::{WalEntry, WalReader};

/// Handles journal recovery after a crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Write time (unix millis) of the last valid entry, 0 when empty
    pub last_timestamp: u64,

    /// Whether the journal was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a journal file
    ///
    /// This will:
    /// 1. Read entries in order until the end of the file
    /// 2. Stop at the first torn or corrupted entry
    /// 3. Truncate the file back to the last complete entry
    /// 4. Return all valid entries in order
    ///
    /// A missing file recovers as empty.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut result = RecoveryResult::default();
        if !path.exists() {
            return Ok((Vec::new(), result));
        }

        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    result.last_timestamp = entry.timestamp;
                    entries.push(entry);
                }
                Ok(None) => break,
                Err(QueueKvError::WalCorruption(reason)) => {
                    tracing::warn!(
                        path = %path.display(),
                        offset = reader.position(),
                        %reason,
                        "Journal tail is damaged, truncating"
                    );
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(reader.position())?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }
}
