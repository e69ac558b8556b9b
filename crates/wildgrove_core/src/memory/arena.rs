//! # Typed Arena
//!
//! Append-only slot storage for values that all die together.

use std::ops::{Index, IndexMut};

/// Index of a value inside an [`Arena`].
///
/// Only meaningful for the arena that produced it, and only until that
/// arena is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u32);

impl ArenaId {
    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An append-only arena of `T`.
///
/// Values are never removed individually. `reset` drops every value at
/// once while keeping the backing allocation, which is what repeated
/// re-planning wants: one search allocates its nodes, the next search
/// reuses the memory.
///
/// # Example
///
/// ```rust
/// use wildgrove_core::Arena;
///
/// let mut arena = Arena::with_capacity(64);
/// let id = arena.alloc(7.5_f32);
/// arena[id] += 1.0;
/// assert_eq!(arena.get(id), Some(&8.5));
/// ```
#[derive(Debug, Clone)]
pub struct Arena<T> {
    /// Slot storage; `ArenaId(i)` addresses `slots[i]`.
    slots: Vec<T>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Creates an empty arena with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Stores a value and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX` values.
    pub fn alloc(&mut self, value: T) -> ArenaId {
        assert!(self.slots.len() < u32::MAX as usize, "arena exceeded u32::MAX slots");
        let index = self.slots.len() as u32;
        self.slots.push(value);
        ArenaId(index)
    }

    /// Looks up a value.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ArenaId) -> Option<&T> {
        self.slots.get(id.index())
    }

    /// Looks up a value mutably.
    #[inline]
    pub fn get_mut(&mut self, id: ArenaId) -> Option<&mut T> {
        self.slots.get_mut(id.index())
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots available before the next reallocation.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Drops every value, keeping the allocation. Outstanding ids become stale.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Iterates over `(id, value)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, value)| (ArenaId(index as u32), value))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<ArenaId> for Arena<T> {
    type Output = T;

    fn index(&self, id: ArenaId) -> &T {
        &self.slots[id.index()]
    }
}

impl<T> IndexMut<ArenaId> for Arena<T> {
    fn index_mut(&mut self, id: ArenaId) -> &mut T {
        &mut self.slots[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena[b], "b");
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut arena = Arena::with_capacity(16);
        for i in 0..16 {
            arena.alloc(i);
        }
        let capacity = arena.capacity();
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), capacity);
    }

    #[test]
    fn test_stale_id_lookup_is_none() {
        let mut arena = Arena::new();
        let id = arena.alloc(1u8);
        arena.reset();
        assert!(arena.get(id).is_none());
    }
}
