//! Write-Ahead Log (WAL) Module
//!
//! Journal that makes the broker's queue survive restarts.
//!
//! ## Responsibilities
//! - Append a record for every enqueue and delete before it takes effect
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Recovery: replay complete entries, drop a torn tail
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! Data is the bincode encoding of a `WalEntry`; integers are little endian.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalEntry, Record, HEADER_SIZE, MAX_ENTRY_SIZE};
pub use writer::WalWriter;
pub use reader::WalReader;
pub use recovery::{WalRecovery, RecoveryResult};
