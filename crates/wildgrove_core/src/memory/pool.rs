//! # Slot Pool
//!
//! Bounded slot storage for records that come and go as the observer moves:
//! loaded terrain chunks and their water planes.

/// Handle to an occupied slot in a [`PoolAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Slot index.
    slot: u32,
}

impl PoolHandle {
    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.slot as usize
    }
}

/// A bounded pool of `T` with O(1) allocate and free.
///
/// Every slot is reserved when the pool is built. A freed slot goes back on
/// the free list and is handed out again by the next allocation, so a pool
/// sized for the visible area stops allocating after warm-up.
///
/// # Thread Safety
///
/// Not synchronized. The chunk store owns its pools on the tick thread.
///
/// # Example
///
/// ```rust
/// use wildgrove_core::PoolAllocator;
///
/// let mut pool = PoolAllocator::new(2);
/// let a = pool.try_allocate("a").unwrap();
/// let _b = pool.try_allocate("b").unwrap();
/// assert_eq!(pool.try_allocate("c"), Err("c"));
///
/// assert_eq!(pool.free(a), Some("a"));
/// assert!(pool.try_allocate("c").is_ok());
/// ```
pub struct PoolAllocator<T> {
    /// Slot storage, `None` when free.
    slots: Box<[Option<T>]>,
    /// Indices of free slots; the last one is handed out next.
    free_list: Vec<u32>,
}

impl<T> PoolAllocator<T> {
    /// Creates a pool with `capacity` slots.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of simultaneously live records
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "pool capacity must be greater than zero");
        assert!(capacity <= u32::MAX as usize, "pool capacity exceeds u32::MAX");
        let top = capacity as u32;

        Self {
            slots: (0..capacity).map(|_| None).collect(),
            free_list: (0..top).rev().collect(),
        }
    }

    /// Total number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns true when no slot is free.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free_list.is_empty()
    }

    /// Stores `value` in a free slot.
    ///
    /// # Errors
    ///
    /// Hands `value` back unchanged when the pool is full, so the caller
    /// can decide whether to drop it or retry after eviction.
    pub fn try_allocate(&mut self, value: T) -> Result<PoolHandle, T> {
        self.try_insert(value).map(|(handle, _)| handle)
    }

    /// Stores `value` in a free slot and returns the handle together with
    /// the stored value.
    ///
    /// # Errors
    ///
    /// Hands `value` back unchanged when the pool is full.
    pub fn try_insert(&mut self, value: T) -> Result<(PoolHandle, &mut T), T> {
        let Some(slot) = self.free_list.pop() else {
            return Err(value);
        };
        let stored = self.slots[slot as usize].insert(value);
        Ok((PoolHandle { slot }, stored))
    }

    /// Frees a slot and returns its value.
    ///
    /// Returns `None` for a handle that is out of range or already freed.
    pub fn free(&mut self, handle: PoolHandle) -> Option<T> {
        let value = self.slots.get_mut(handle.index())?.take()?;
        self.free_list.push(handle.slot);
        Some(value)
    }

    /// Looks up an occupied slot.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.index())?.as_ref()
    }

    /// Looks up an occupied slot mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index())?.as_mut()
    }

    /// Frees every slot. Storage is kept.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        let top = self.slots.len() as u32;
        self.free_list.clear();
        self.free_list.extend((0..top).rev());
    }

    /// Iterates over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|value| {
                (
                    PoolHandle {
                        slot: index as u32,
                    },
                    value,
                )
            })
        })
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_then_free() {
        let mut pool = PoolAllocator::new(4);
        let handle = pool.try_allocate(42u32).unwrap();
        assert_eq!(pool.get(handle), Some(&42));
        assert_eq!(pool.allocated_count(), 1);

        assert_eq!(pool.free(handle), Some(42));
        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.free(handle), None);
    }

    #[test]
    fn test_full_pool_returns_value() {
        let mut pool = PoolAllocator::new(1);
        pool.try_allocate(String::from("first")).unwrap();
        assert!(pool.is_full());
        assert_eq!(pool.try_allocate(String::from("second")), Err(String::from("second")));
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut pool = PoolAllocator::new(3);
        let _a = pool.try_allocate(1).unwrap();
        let b = pool.try_allocate(2).unwrap();
        pool.free(b);
        let c = pool.try_allocate(3).unwrap();
        assert_eq!(b.index(), c.index());
        assert_eq!(pool.get(c), Some(&3));
    }

    #[test]
    fn test_clear_frees_everything() {
        let mut pool = PoolAllocator::new(2);
        pool.try_allocate('x').unwrap();
        pool.try_allocate('y').unwrap();
        pool.clear();
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.iter().count(), 0);
    }
}
