//! # Memory Management
//!
//! Slot containers that keep allocation churn out of the tick loop.
//!
//! ## Design Philosophy
//!
//! - Search nodes are created lazily and addressed by index, never boxed
//! - Loaded chunk records reuse freed slots instead of reallocating
//! - Resetting a container keeps its backing capacity

mod arena;
mod pool;

pub use arena::{Arena, ArenaId};
pub use pool::{PoolAllocator, PoolHandle};
