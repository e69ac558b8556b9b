//! # Wildgrove
//!
//! Terrain streaming and incremental pathfinding, wired together for hosts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            HOST TICK                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌────────────────────┐   tiles    ┌────────────────────┐        │
//! │  │ ChunkStreamer      │<───────────│ synthesis workers  │        │
//! │  │  evict / dispatch  │            │ (only off-thread   │        │
//! │  │  commit / spawn    │            │  work)             │        │
//! │  └─────────┬──────────┘            └────────────────────┘        │
//! │            │ &ChunkStore                                         │
//! │            v                                                     │
//! │  ┌────────────────────┐  &oracle   ┌────────────────────┐        │
//! │  │ WorldTerrainOracle │───────────>│ PathAgent          │        │
//! │  │  ground + water +  │            │  DStarLite plan,   │        │
//! │  │  blocked cells     │            │  retry and repair  │        │
//! │  └────────────────────┘            └────────────────────┘        │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `world`: the host-side terrain oracle
//! - `session`: a headless fixed-step loop over all of the above

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod session;
pub mod world;

// Re-export the units
pub use wildgrove_core as core;
pub use wildgrove_navigation as navigation;
pub use wildgrove_procedural as procedural;
pub use wildgrove_shared as shared;

// Re-export commonly used types
pub use session::{WalkFrame, WalkSession, OBSERVER_EYE_HEIGHT};
pub use world::WorldTerrainOracle;
