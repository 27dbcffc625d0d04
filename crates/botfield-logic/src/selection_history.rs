//! Bounded history of previously selected objects.
//!
//! Deselecting an object without choosing a replacement goes back to the
//! most recent distinct entry instead of always falling back to the pilot.

use std::collections::VecDeque;

use crate::constants::SELECTION_HISTORY_LEN;

/// LIFO of object handles with adjacent de-duplication.
#[derive(Debug, Clone)]
pub struct SelectionHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy + PartialEq> SelectionHistory<T> {
    pub fn new() -> Self {
        Self::with_capacity(SELECTION_HISTORY_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Push an entry unless it equals the current top. The oldest entry is
    /// dropped when the history is full.
    pub fn push(&mut self, item: T) {
        if self.entries.back() == Some(&item) {
            return;
        }
        self.entries.push_back(item);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    /// Remove every occurrence of `item` (the object was destroyed). Entries
    /// that become neighbours are collapsed again.
    pub fn remove(&mut self, item: T) {
        self.entries.retain(|e| *e != item);
        let mut previous: Option<T> = None;
        self.entries.retain(|e| {
            let keep = previous != Some(*e);
            previous = Some(*e);
            keep
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Copy + PartialEq> Default for SelectionHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_lifo() {
        let mut h = SelectionHistory::new();
        h.push(1);
        h.push(2);
        h.push(3);
        assert_eq!(h.pop(), Some(3));
        assert_eq!(h.pop(), Some(2));
        assert_eq!(h.pop(), Some(1));
        assert_eq!(h.pop(), None);
    }

    #[test]
    fn test_no_adjacent_duplicates() {
        let mut h = SelectionHistory::new();
        h.push(7);
        h.push(7);
        h.push(8);
        h.push(8);
        h.push(7);
        let entries: Vec<_> = h.iter().copied().collect();
        assert_eq!(entries, vec![7, 8, 7]);
        for pair in entries.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_bounded_length() {
        let mut h = SelectionHistory::new();
        for i in 0..120 {
            h.push(i);
        }
        assert_eq!(h.len(), SELECTION_HISTORY_LEN);
        assert_eq!(h.pop(), Some(119));
        assert_eq!(h.iter().next(), Some(&70));
    }

    #[test]
    fn test_remove_all_occurrences() {
        let mut h = SelectionHistory::new();
        h.push(1);
        h.push(2);
        h.push(1);
        h.remove(1);
        assert_eq!(h.len(), 1);
        assert_eq!(h.pop(), Some(2));
    }

    #[test]
    fn test_remove_collapses_new_neighbours() {
        let mut h = SelectionHistory::new();
        h.push(1);
        h.push(2);
        h.push(1);
        h.push(3);
        h.push(1);
        h.remove(2);
        let entries: Vec<_> = h.iter().copied().collect();
        assert_eq!(entries, vec![1, 3, 1]);
        h.remove(3);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![1]);
    }
}
