//! Recorders for cleanup ordering.

use std::sync::{Arc, Mutex, MutexGuard};

use badger_core::{AsCleanable, Cleanable};

/// Shared, append-only log of fired cleanups.
///
/// Clones share the same log, so a clone can be moved into each cleanup
/// closure while the test keeps one to inspect. Handed-out recorders are
/// `Send + 'static`, as [`Cleanable`] requires.
#[derive(Clone, Default)]
pub struct CleanupLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CleanupLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A closure that appends `label` when run.
    pub fn recorder(&self, label: impl Into<String>) -> impl FnOnce() + Send + 'static {
        let entries = Arc::clone(&self.entries);
        let label = label.into();
        move || lock(&entries).push(label)
    }

    /// Register a recorder for `label` on `chain`.
    pub fn register<T: AsCleanable + ?Sized>(&self, chain: &mut T, label: impl Into<String>) {
        chain.as_cleanable_mut().register_cleanup(self.recorder(label));
    }

    /// Labels in firing order.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// How many times `label` fired.
    pub fn count(&self, label: &str) -> usize {
        lock(&self.entries).iter().filter(|e| *e == label).count()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CleanupLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(lock(&self.entries).iter()).finish()
    }
}

// A panic inside a recorder must not hide what was logged before it.
fn lock(entries: &Mutex<Vec<String>>) -> MutexGuard<'_, Vec<String>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_firing_order() {
        let log = CleanupLog::new();
        let mut chain = Cleanable::new();
        log.register(&mut chain, "a");
        log.register(&mut chain, "b");
        assert!(log.is_empty());
        drop(chain);
        assert_eq!(log.entries(), ["a", "b"]);
        assert_eq!(log.count("a"), 1);
    }

    #[test]
    fn clones_share_entries() {
        let log = CleanupLog::new();
        let other = log.clone();
        (other.recorder("x"))();
        assert_eq!(log.len(), 1);
    }
}
