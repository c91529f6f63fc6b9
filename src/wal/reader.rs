//! WAL Reader
//!
//! Handles reading entries from the journal file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{QueueKvError, Result};

use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// Reads entries from the journal file
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset just past the last entry read successfully
    position: u64,
}

impl WalReader {
    /// Open a journal file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry
    ///
    /// Returns `Ok(None)` at a clean end of file and `WalCorruption` for a
    /// torn or damaged entry.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = self.read_fully(&mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(QueueKvError::WalCorruption(format!(
                "torn header at offset {} ({} of {} bytes)",
                self.position, read, HEADER_SIZE
            )));
        }

        let lsn = u64::from_le_bytes([
            header[0], header[1], header[2], header[3],
            header[4], header[5], header[6], header[7],
        ]);
        let crc = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        let len = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

        if len > MAX_ENTRY_SIZE {
            return Err(QueueKvError::WalCorruption(format!(
                "entry length {} at offset {} exceeds maximum {}",
                len, self.position, MAX_ENTRY_SIZE
            )));
        }

        let mut data = vec![0u8; len as usize];
        let read = self.read_fully(&mut data)?;
        if read < data.len() {
            return Err(QueueKvError::WalCorruption(format!(
                "torn entry at offset {} ({} of {} data bytes)",
                self.position, read, len
            )));
        }

        let entry = WalEntry::decode(lsn, crc, &data)?;
        self.position += (HEADER_SIZE + data.len()) as u64;
        Ok(Some(entry))
    }

    /// Byte offset of the end of the valid prefix read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fill `buf` as far as the file allows, returning the byte count
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}
