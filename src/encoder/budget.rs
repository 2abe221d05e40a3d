// Byte budget for a bounded document

use serde::Serialize;
use std::io;

/// Tracks how many bytes of a document are spoken for. Reservations that would exceed the
/// capacity are refused and leave the budget unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    capacity: usize,
    used: usize,
}

impl Budget {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, used: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    pub fn reserve(&mut self, len: usize) -> bool {
        if len > self.remaining() {
            return false;
        }
        self.used += len;
        true
    }

    /// Reserves items in order until one does not fit and returns how many were taken.
    /// Every item after the first also costs `separator` bytes.
    pub fn take_fitting<I>(&mut self, lens: I, separator: usize) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        let mut taken = 0;
        for len in lens {
            let cost = if taken == 0 {
                len
            } else {
                len.saturating_add(separator)
            };
            if !self.reserve(cost) {
                break;
            }
            taken += 1;
        }
        taken
    }
}

/// Length of `value` as compact JSON, without building the string.
/// Values that cannot be serialized report `usize::MAX` so they never fit a budget.
pub fn encoded_len<T: Serialize + ?Sized>(value: &T) -> usize {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, value) {
        Ok(()) => counter.0,
        Err(_) => usize::MAX,
    }
}

struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_refuses_overflow_and_keeps_state() {
        let mut budget = Budget::new(10);
        assert!(budget.reserve(6));
        assert!(!budget.reserve(5));
        assert_eq!(budget.used(), 6);
        assert!(budget.reserve(4));
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn take_fitting_counts_separators_after_first() {
        // 3 + (1+3) + (1+3) = 11 fits in 11; a fourth item would not.
        let mut budget = Budget::new(11);
        assert_eq!(budget.take_fitting([3, 3, 3, 3], 1), 3);
        assert_eq!(budget.used(), 11);
    }

    #[test]
    fn take_fitting_stops_at_first_item_that_does_not_fit() {
        let mut budget = Budget::new(10);
        assert_eq!(budget.take_fitting([2, 20, 1], 1), 1);
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn encoded_len_matches_serialized_string() {
        let value = serde_json::json!({"a": [1.5, 2.0], "b": "x\"y"});
        let s = serde_json::to_string(&value).unwrap();
        assert_eq!(encoded_len(&value), s.len());
    }
}
