//! Logical clock over completed clipboard operations.

use std::cell::Cell;
use std::rc::Rc;

/// Counts clipboard operations that actually touched the platform clipboard.
///
/// Clones share one counter. Sample with [`snapshot`](Self::snapshot) before
/// handing control to the platform, then ask
/// [`has_advanced_since`](Self::has_advanced_since) to learn whether some
/// clipboard event ran in between.
#[derive(Clone, Debug, Default)]
pub struct SerialTracker {
    value: Rc<Cell<u64>>,
}

impl SerialTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed operation and return the new value.
    pub fn next(&self) -> u64 {
        let next = self.value.get() + 1;
        self.value.set(next);
        next
    }

    /// Current value, without incrementing.
    pub fn snapshot(&self) -> u64 {
        self.value.get()
    }

    pub fn has_advanced_since(&self, snapshot: u64) -> bool {
        self.value.get() > snapshot
    }
}
