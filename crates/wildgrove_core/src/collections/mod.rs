//! # Collections
//!
//! Ordered containers used by the per-tick control loop.

mod priority_queue;

pub use priority_queue::PriorityQueue;
