//! # QueueKV
//!
//! A key-value store whose only channel is a FIFO message queue:
//! - Producers encode commands as queue messages (fire-and-forget)
//! - A consumer drains the queue into an in-memory ordered store
//! - At-least-once delivery: visibility timeout + delete on completion
//! - Bounded worker pool instead of unbounded per-message threads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  encode   ┌──────────────────────────────┐
//! │   Producer   ├──────────►│        QueueTransport        │
//! │    (CLI)     │           │ (MemoryQueue / TcpQueue ──►  │
//! └──────────────┘           │      broker + journal)       │
//!                            └──────────────┬───────────────┘
//!                                           │ receive_batch / delete
//!                            ┌──────────────▼───────────────┐
//!                            │       Consumer Engine        │
//!                            │ receive loop + worker pool   │
//!                            └──────────────┬───────────────┘
//!                                           │ decode + handle
//!                            ┌──────────────▼───────────────┐
//!                            │        OrderedStore          │
//!                            │   (single Mutex, in-memory)  │
//!                            └──────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod logging;
pub mod shutdown;

pub mod command;
pub mod store;
pub mod handler;
pub mod transport;
pub mod engine;
pub mod producer;

pub mod wal;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DecodeError, QueueKvError, Result};
pub use config::Config;
pub use command::{Action, Command};
pub use store::OrderedStore;
pub use engine::Consumer;
pub use producer::Producer;
pub use shutdown::ShutdownHandle;
pub use transport::{MemoryQueue, QueueTransport, TcpQueue};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of QueueKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
