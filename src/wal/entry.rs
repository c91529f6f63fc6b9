//! WAL Entry definitions
//!
//! Defines the structure of individual journal entries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{QueueKvError, Result};

/// Header size: LSN (8) + CRC (4) + data length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest data section accepted when reading (guards against garbage lengths)
pub const MAX_ENTRY_SIZE: u32 = 16 * 1024 * 1024;

/// A single entry in the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The queue mutation being recorded
    pub record: Record,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Queue mutations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// A message was accepted into the queue
    Enqueued {
        message_id: String,
        body: String,
        group_id: String,
    },

    /// A message was acknowledged and removed
    Deleted { message_id: String },
}

impl WalEntry {
    pub fn new(lsn: u64, record: Record) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            record,
            timestamp,
        }
    }

    /// Serialize to the on-disk format: header + data
    pub fn encode(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(QueueKvError::Serialization(format!(
                "WAL entry too large: {} bytes (max {})",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&Self::compute_crc(&data).to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Rebuild an entry from its header fields and data section
    ///
    /// Fails with `WalCorruption` on a checksum or LSN mismatch.
    pub fn decode(lsn: u64, crc: u32, data: &[u8]) -> Result<Self> {
        let actual = Self::compute_crc(data);
        if actual != crc {
            return Err(QueueKvError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| QueueKvError::WalCorruption(format!("undecodable entry at LSN {}: {}", lsn, e)))?;

        if entry.lsn != lsn {
            return Err(QueueKvError::WalCorruption(format!(
                "LSN mismatch: header says {}, entry says {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
