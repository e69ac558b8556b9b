//! # Wildgrove Navigation
//!
//! Incremental pathfinding for agents walking streamed terrain.
//!
//! ## Core Components
//!
//! - `GridPos`: cell of the implicit 8-connected grid, one per world unit
//! - `DStarLite`: goal-to-start search whose cost field survives repairs
//! - `PathAgent`: per-agent plan, retry and repair policy
//! - `TerrainOracle`: ground and obstacle queries supplied by the host
//!
//! ## Ownership
//!
//! A search owns its nodes and its last path. The oracle is borrowed for
//! each call, so the host keeps sole ownership of its terrain and can
//! mutate it between agent ticks.
//!
//! ## Example
//!
//! ```rust
//! use wildgrove_navigation::{BlockedCells, DStarLite, GridPos, SearchConfig, SplitOracle};
//! use wildgrove_shared::{FlatGround, Vec3};
//!
//! let walls: BlockedCells = (-2..=2).map(|z| GridPos::new(2, z)).collect();
//! let oracle = SplitOracle::new(FlatGround { height: 0.0 }, walls);
//!
//! let mut search = DStarLite::new(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), SearchConfig::default()).unwrap();
//! let path = search.calculate_path(&oracle).unwrap();
//! assert_eq!(path.last(), Some(&GridPos::new(5, 0)));
//! assert!(path.iter().all(|cell| cell.x != 2 || cell.z.abs() > 2));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod config;
pub mod dstar;
pub mod error;
pub mod grid;
pub mod oracle;

pub use agent::{AgentStep, DistanceStatus, PathAgent};
pub use config::{AgentConfig, Heuristic, SearchConfig};
pub use dstar::{DStarLite, Key, SearchStats};
pub use error::{NavError, NavResult};
pub use grid::GridPos;
pub use oracle::{BlockedCells, SplitOracle, TerrainOracle};
pub use wildgrove_shared::{ConfigError, ConfigResult};
