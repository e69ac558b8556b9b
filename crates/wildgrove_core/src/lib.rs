//! # Wildgrove Core
//!
//! Small, allocation-aware containers shared by the streaming and
//! pathfinding crates.
//!
//! ## Core Components
//!
//! - `PriorityQueue`: binary min-heap ordered by a caller-supplied comparator,
//!   with arbitrary-element removal
//! - `Arena`: typed slot arena addressed by `ArenaId`
//! - `PoolAllocator`: fixed-capacity slot pool addressed by `PoolHandle`
//!
//! ## Example
//!
//! ```rust
//! use wildgrove_core::PriorityQueue;
//!
//! let mut queue = PriorityQueue::from_ord();
//! queue.enqueue(3);
//! queue.enqueue(1);
//! assert_eq!(queue.dequeue(), Ok(1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod memory;

pub use collections::PriorityQueue;
pub use error::{QueueError, QueueResult};
pub use memory::{Arena, ArenaId, PoolAllocator, PoolHandle};
