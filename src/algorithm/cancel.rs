//! Cooperative cancellation flag shared by an algorithm and its children.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn downgrade(&self) -> WeakCancelFlag {
        WeakCancelFlag(Arc::downgrade(&self.0))
    }
}

/// Non-owning reference used by the manager to cancel live algorithms.
#[derive(Debug, Clone)]
pub struct WeakCancelFlag(Weak<AtomicBool>);

impl WeakCancelFlag {
    /// Cancel if the owner is still alive; returns whether it was.
    pub fn cancel(&self) -> bool {
        match self.0.upgrade() {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
