//! Store Module
//!
//! In-memory key-value container shared by all message workers.
//!
//! ## Responsibilities
//! - Map keys to their latest value
//! - Remember first-insertion order for enumeration
//! - Serialise every read and write behind one lock
//!
//! ## Data Structure Choice
//! HashMap for lookups plus a Vec of keys for order, both behind a single
//! parking_lot Mutex. Callers never see the lock: each public operation
//! acquires it once and performs all of its steps inside.
//!
//! Nothing here is persisted; the store starts empty on every process start.

mod ordered;

pub use ordered::OrderedStore;

/// Result of an `add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddResult {
    /// True when the key was not present before
    pub inserted: bool,

    /// Value that was overwritten, if the key already existed
    pub previous: Option<String>,
}
