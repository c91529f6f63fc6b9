//! Network Module
//!
//! TCP broker hosting a `MemoryQueue`.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop (polls the shutdown flag)
//! - Fixed worker thread pool for connections, fed by a bounded channel
//! - Requests executed directly against the shared queue

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
