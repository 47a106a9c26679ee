use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of unique particle ids.
///
/// Clones share the same counter, so showers evaluated on different threads
/// from one allocator never hand out the same id. Ids are unique, not
/// necessarily contiguous within a shower.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    /// Allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Take the next id.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far (for a fresh allocator).
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
