//! Bounded result queue for kNN search.
//!
//! A fixed-capacity max-heap keyed by distance that retains the `k` closest
//! points pushed into it. Equal distances are ordered by push order, so an
//! earlier discovery wins a tie. The natural pop order is farthest first;
//! [`KnnQueue::into_ascending`] drains it into nearest-first order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use vecnn_types::PointId;

/// A search result: identifier, store position and distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: PointId,
    pub position: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    distance: f32,
    seq: u64,
    id: PointId,
    position: usize,
}

impl Entry {
    fn key(&self) -> (f32, u64) {
        (self.distance, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        let (da, sa) = self.key();
        let (db, sb) = other.key();
        da.total_cmp(&db).then(sa.cmp(&sb))
    }
}

/// Fixed-capacity max-heap holding the `k` smallest-distance entries seen.
#[derive(Debug, Clone)]
pub struct KnnQueue {
    k: usize,
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl KnnQueue {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(4096)),
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// Distance of the farthest retained entry.
    pub fn top_distance(&self) -> Option<f32> {
        self.heap.peek().map(|e| e.distance)
    }

    /// Offer a candidate. Returns `true` if it was retained.
    pub fn push(&mut self, id: PointId, position: usize, distance: f32) -> bool {
        if self.k == 0 {
            return false;
        }
        let entry = Entry {
            distance,
            seq: self.next_seq,
            id,
            position,
        };
        self.next_seq += 1;

        if self.heap.len() < self.k {
            self.heap.push(entry);
            return true;
        }
        match self.heap.peek() {
            Some(top) if entry < *top => {
                self.heap.pop();
                self.heap.push(entry);
                true
            }
            _ => false,
        }
    }

    /// Remove and return the farthest retained entry.
    pub fn pop(&mut self) -> Option<Neighbor> {
        self.heap.pop().map(|e| Neighbor {
            id: e.id,
            position: e.position,
            distance: e.distance,
        })
    }

    /// Drain into nearest-first order.
    ///
    /// Pops the current maximum repeatedly and prepends it, so the output is
    /// ascending by distance (ties in discovery order).
    pub fn into_ascending(mut self) -> Vec<Neighbor> {
        let mut out = VecDeque::with_capacity(self.heap.len());
        while let Some(neighbor) = self.pop() {
            out.push_front(neighbor);
        }
        out.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_k_smallest() {
        let mut queue = KnnQueue::new(3);
        for (i, d) in [5.0, 1.0, 4.0, 2.0, 3.0].iter().enumerate() {
            queue.push(i as PointId, i, *d);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.top_distance(), Some(3.0));
        let ids: Vec<PointId> = queue.into_ascending().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_pop_order_is_descending() {
        let mut queue = KnnQueue::new(4);
        queue.push(1, 0, 1.0);
        queue.push(2, 1, 3.0);
        queue.push(3, 2, 2.0);
        assert_eq!(queue.pop().map(|n| n.id), Some(2));
        assert_eq!(queue.pop().map(|n| n.id), Some(3));
        assert_eq!(queue.pop().map(|n| n.id), Some(1));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_fewer_candidates_than_k() {
        let mut queue = KnnQueue::new(10);
        queue.push(7, 0, 0.5);
        queue.push(8, 1, 0.25);
        let result = queue.into_ascending();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 8);
    }

    #[test]
    fn test_ties_resolved_by_discovery_order() {
        let mut queue = KnnQueue::new(2);
        assert!(queue.push(1, 0, 1.0));
        assert!(queue.push(2, 1, 1.0));
        // Same distance, discovered later: not retained when full.
        assert!(!queue.push(3, 2, 1.0));
        assert!(queue.push(4, 3, 0.5));
        let ids: Vec<PointId> = queue.into_ascending().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut queue = KnnQueue::new(0);
        assert!(!queue.push(1, 0, 0.0));
        assert!(queue.into_ascending().is_empty());
    }
}
