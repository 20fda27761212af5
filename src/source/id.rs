use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic ID service scoped to one session. Cloning shares the counter, so
/// the history generator and the live-push generator never hand out the same
/// id.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: Arc<AtomicI64>,
}

impl IdGenerator {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: Arc::new(AtomicI64::new(first)),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
