/*!
 * Execution context validity.
 *
 * The host may unload the component at any moment. Every store and network
 * call checks the shared context first and degrades to an empty/no-op result
 * once it has been invalidated. Invalidation is one-way.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

/// Shared handle reporting whether the hosting context is still alive
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    valid: Arc<AtomicBool>,
}

impl ExecutionContext {
    /// Create a live context
    pub fn new() -> Self {
        Self {
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether the host is still alive
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    /// Mark the context as unloaded; all clones observe it
    pub fn invalidate(&self) {
        if self.valid.swap(false, Ordering::SeqCst) {
            warn!("Execution context invalidated");
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
