// Latest published snapshot: one writer (the sampling loop), any number of readers.

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Served as /api/system before the first cycle completes.
pub const NOT_READY_DOCUMENT: &str = r#"{"error":"Data not ready yet","timestamp":0}"#;
/// Served as /api/history before the first cycle completes.
pub const NOT_READY_HISTORY: &str = r#"{"error":"History not ready yet","timestamp":0}"#;

/// The document pair produced by a single cycle. Immutable once published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSnapshot {
    pub document: Bytes,
    pub history: Bytes,
    /// 1-based cycle number; 0 for the not-ready placeholder.
    pub cycle: u64,
}

impl PublishedSnapshot {
    fn not_ready() -> Self {
        Self {
            document: Bytes::from_static(NOT_READY_DOCUMENT.as_bytes()),
            history: Bytes::from_static(NOT_READY_HISTORY.as_bytes()),
            cycle: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cycle > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    NotReady,
    Ready,
}

/// Holds the current snapshot behind a shared-read lock. A publish swaps in a whole new
/// `Arc`, so a reader gets either the previous pair or the new one, never a mix.
#[derive(Debug)]
pub struct SnapshotPublisher {
    current: RwLock<Arc<PublishedSnapshot>>,
    cycles: AtomicU64,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(PublishedSnapshot::not_ready())),
            cycles: AtomicU64::new(0),
        }
    }

    /// Installs a new pair and returns its cycle number. Only the sampling loop calls this.
    pub fn publish(&self, document: impl Into<Bytes>, history: impl Into<Bytes>) -> u64 {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let next = Arc::new(PublishedSnapshot {
            document: document.into(),
            history: history.into(),
            cycle,
        });
        // The guarded value is replaced in one assignment, so a poisoned lock still holds a
        // complete snapshot.
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        drop(guard);
        drop(previous);
        cycle
    }

    /// The current pair, or the not-ready placeholders before the first publish.
    pub fn read(&self) -> Arc<PublishedSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> PublisherState {
        if self.read().is_ready() {
            PublisherState::Ready
        } else {
            PublisherState::NotReady
        }
    }
}
