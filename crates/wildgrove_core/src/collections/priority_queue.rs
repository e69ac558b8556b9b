//! # Binary Min-Heap Priority Queue
//!
//! A heap-ordered `Vec` whose ordering is supplied by the caller at
//! construction. Two orderings live on top of it in this workspace:
//!
//! - chunk tiles ordered by Manhattan distance to the observer
//! - D*-Lite open-set entries ordered by their two-component key
//!
//! ## Removal
//!
//! `remove` swaps the last element into the vacated slot and then restores
//! the heap property in whichever direction the moved element needs. The
//! moved element can be smaller than its new parent when it came from a
//! different subtree, so sifting only downward is not enough.

use std::cmp::Ordering;

use crate::error::{QueueError, QueueResult};

/// Binary min-heap keyed by a comparator.
///
/// The comparator must be a strict weak ordering. The element for which the
/// comparator returns `Ordering::Less` against every other element is the
/// one `dequeue` returns first.
///
/// # Thread Safety
///
/// Not synchronized. One queue per owner.
///
/// # Example
///
/// ```rust
/// use wildgrove_core::PriorityQueue;
///
/// let mut queue = PriorityQueue::new(|a: &(u32, char), b: &(u32, char)| a.0.cmp(&b.0));
/// queue.enqueue((2, 'b'));
/// queue.enqueue((1, 'a'));
/// assert_eq!(queue.peek().map(|item| item.1), Ok('a'));
/// ```
pub struct PriorityQueue<T, C = fn(&T, &T) -> Ordering> {
    /// Heap-ordered storage.
    heap: Vec<T>,
    /// Ordering supplied at construction.
    comparator: C,
}

impl<T: Ord> PriorityQueue<T> {
    /// Creates a queue ordered by `T`'s own `Ord` implementation.
    #[must_use]
    pub fn from_ord() -> Self {
        Self::new(T::cmp)
    }
}

impl<T, C> PriorityQueue<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty queue with the given ordering.
    #[must_use]
    pub fn new(comparator: C) -> Self {
        Self {
            heap: Vec::new(),
            comparator,
        }
    }

    /// Creates an empty queue with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize, comparator: C) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            comparator,
        }
    }

    /// Number of queued elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Inserts an element.
    pub fn enqueue(&mut self, item: T) {
        self.heap.push(item);
        let last = self.heap.len() - 1;
        self.sift_up(last);
    }

    /// Removes and returns the minimum element.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Empty` if the queue is empty.
    pub fn dequeue(&mut self) -> QueueResult<T> {
        if self.heap.is_empty() {
            return Err(QueueError::Empty);
        }
        let min = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok(min)
    }

    /// Returns the minimum element without removing it.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Empty` if the queue is empty.
    pub fn peek(&self) -> QueueResult<&T> {
        self.heap.first().ok_or(QueueError::Empty)
    }

    /// Removes the first element matching `predicate`, returning it.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.heap.iter().position(|item| predicate(item))?;
        Some(self.remove_at(index))
    }

    /// Mutates every element in place, then rebuilds the heap.
    ///
    /// Used when the quantity the comparator reads has changed for all
    /// elements at once (the observer moved to another chunk).
    pub fn rebuild_with(&mut self, mut update: impl FnMut(&mut T)) {
        for item in &mut self.heap {
            update(item);
        }
        for index in (0..self.heap.len() / 2).rev() {
            self.sift_down(index);
        }
    }

    /// Removes every element, in no particular order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.heap.drain(..)
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Iterates over the queued elements in heap (not sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter()
    }

    /// Removes the element at `index` and restores the heap property.
    fn remove_at(&mut self, index: usize) -> T {
        let removed = self.heap.swap_remove(index);
        if index < self.heap.len() && !self.sift_up(index) {
            self.sift_down(index);
        }
        removed
    }

    /// Moves the element at `index` toward the root. Returns true if it moved.
    fn sift_up(&mut self, mut index: usize) -> bool {
        let start = index;
        while index > 0 {
            let parent = (index - 1) / 2;
            if (self.comparator)(&self.heap[parent], &self.heap[index]) != Ordering::Greater {
                break;
            }
            self.heap.swap(parent, index);
            index = parent;
        }
        index != start
    }

    /// Moves the element at `index` toward the leaves.
    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && (self.comparator)(&self.heap[left], &self.heap[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len && (self.comparator)(&self.heap[right], &self.heap[smallest]) == Ordering::Less {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<T, C> PriorityQueue<T, C>
where
    T: PartialEq,
    C: Fn(&T, &T) -> Ordering,
{
    /// Removes one occurrence of `item`. Returns whether it was found.
    pub fn remove(&mut self, item: &T) -> bool {
        self.remove_where(|queued| queued == item).is_some()
    }

    /// Returns true if an element equal to `item` is queued.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.heap.contains(item)
    }
}

impl<T: std::fmt::Debug, C> std::fmt::Debug for PriorityQueue<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.heap.len())
            .field("heap", &self.heap)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_sorted<C: Fn(&i32, &i32) -> Ordering>(queue: &mut PriorityQueue<i32, C>) -> Vec<i32> {
        let mut out = Vec::new();
        while let Ok(value) = queue.dequeue() {
            out.push(value);
        }
        out
    }

    #[test]
    fn test_dequeue_returns_minimum() {
        let mut queue = PriorityQueue::from_ord();
        for value in [5, 3, 8, 1, 9, 2] {
            queue.enqueue(value);
        }
        assert_eq!(drain_sorted(&mut queue), vec![1, 2, 3, 5, 8, 9]);
    }

    #[test]
    fn test_empty_queue_errors() {
        let mut queue: PriorityQueue<i32> = PriorityQueue::from_ord();
        assert_eq!(queue.peek(), Err(QueueError::Empty));
        assert_eq!(queue.dequeue(), Err(QueueError::Empty));
    }

    #[test]
    fn test_custom_comparator_reverses_order() {
        let mut queue = PriorityQueue::new(|a: &i32, b: &i32| b.cmp(a));
        for value in [1, 4, 2] {
            queue.enqueue(value);
        }
        assert_eq!(queue.peek(), Ok(&4));
        assert_eq!(drain_sorted(&mut queue), vec![4, 2, 1]);
    }

    #[test]
    fn test_remove_then_contains_is_false() {
        let mut queue = PriorityQueue::from_ord();
        for value in [7, 3, 5] {
            queue.enqueue(value);
        }
        assert!(queue.remove(&5));
        assert!(!queue.contains(&5));
        assert!(!queue.remove(&5));
        assert_eq!(drain_sorted(&mut queue), vec![3, 7]);
    }

    #[test]
    fn test_remove_moves_replacement_upward() {
        // Enqueued in this order the heap array is [1, 10, 2, 11, 12, 3, 4].
        // Removing 11 moves 4 under 10, so the slot must sift up.
        let mut queue = PriorityQueue::from_ord();
        for value in [1, 10, 2, 11, 12, 3, 4] {
            queue.enqueue(value);
        }
        assert!(queue.remove(&11));
        assert_eq!(drain_sorted(&mut queue), vec![1, 2, 3, 4, 10, 12]);
    }

    #[test]
    fn test_rebuild_with_reorders() {
        let mut queue = PriorityQueue::new(|a: &(i32, i32), b: &(i32, i32)| a.0.cmp(&b.0));
        for id in 0..5 {
            queue.enqueue((id, id));
        }
        // Invert every priority.
        queue.rebuild_with(|item| item.0 = -item.1);
        assert_eq!(queue.dequeue().map(|item| item.1), Ok(4));
        assert_eq!(queue.dequeue().map(|item| item.1), Ok(3));
    }

    #[test]
    fn test_remove_where_returns_item() {
        let mut queue = PriorityQueue::new(|a: &(u8, &'static str), b: &(u8, &'static str)| a.0.cmp(&b.0));
        queue.enqueue((2, "two"));
        queue.enqueue((1, "one"));
        let removed = queue.remove_where(|item| item.1 == "two");
        assert_eq!(removed, Some((2, "two")));
        assert_eq!(queue.len(), 1);
    }
}
