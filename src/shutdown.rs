//! Shutdown signalling
//!
//! A cloneable flag shared between a long-running loop and whoever asks it
//! to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{QueueKvError, Result};

/// Cooperative stop flag for the consumer loop and the broker accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the owning loop to stop after its current step
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Trigger this handle on Ctrl+C or SIGTERM
    ///
    /// A process can install only one handler; a second call fails.
    pub fn trigger_on_signal(&self) -> Result<()> {
        let handle = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Received shutdown signal, initiating shutdown...");
            handle.trigger();
        })
        .map_err(|e| QueueKvError::Config(format!("cannot install signal handler: {}", e)))
    }
}
