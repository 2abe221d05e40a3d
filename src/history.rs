// Fixed-capacity rolling history of the charted series

use crate::models::HistoryEntry;
use std::iter::FusedIterator;

/// Number of entries kept when no capacity is configured (two minutes at the default cadence).
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

/// Circular store allocated once at construction. Once full, each append overwrites the oldest
/// entry; nothing else ever removes one.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: Box<[HistoryEntry]>,
    index: usize,
    count: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryRing {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![HistoryEntry::default(); capacity.max(1)].into_boxed_slice(),
            index: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Slot the next append writes to.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries[self.index] = entry;
        self.index = (self.index + 1) % self.entries.len();
        if self.count < self.entries.len() {
            self.count += 1;
        }
    }

    /// The stored entries, oldest first. Call again to restart.
    pub fn iter(&self) -> Ordered<'_> {
        Ordered {
            ring: self,
            front: 0,
            back: self.count,
        }
    }

    /// Physical slot of the `i`-th entry in chronological order.
    fn slot(&self, i: usize) -> usize {
        let capacity = self.entries.len();
        (self.index + capacity - self.count + i) % capacity
    }
}

impl<'a> IntoIterator for &'a HistoryRing {
    type Item = &'a HistoryEntry;
    type IntoIter = Ordered<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Chronological view over a [`HistoryRing`].
#[derive(Debug, Clone)]
pub struct Ordered<'a> {
    ring: &'a HistoryRing,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Ordered<'a> {
    type Item = &'a HistoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let entry = &self.ring.entries[self.ring.slot(self.front)];
        self.front += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Ordered<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.ring.entries[self.ring.slot(self.back)])
    }
}

impl ExactSizeIterator for Ordered<'_> {}

impl FusedIterator for Ordered<'_> {}
