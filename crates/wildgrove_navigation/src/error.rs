//! # Navigation Error Types

use thiserror::Error;
use wildgrove_shared::ConfigError;

use crate::grid::GridPos;

/// Pathfinding failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    /// The search bounds were rejected.
    #[error("invalid search config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Start or goal lies outside the search radius around the start.
    #[error("goal {goal} is outside the search radius {max_distance} around {start}")]
    OutOfRange {
        /// Start cell.
        start: GridPos,
        /// Goal cell.
        goal: GridPos,
        /// Search radius in cells.
        max_distance: u32,
    },

    /// Path extraction reached a cell with no unvisited, passable neighbour.
    #[error("no path: dead end at {at}")]
    PathNotFound {
        /// Cell where extraction stopped.
        at: GridPos,
    },

    /// The open queue ran dry while the start was still inconsistent.
    ///
    /// Never returned. It names the loop invariant the search asserts.
    #[error("open queue is empty while the start node is inconsistent")]
    EmptyOpenQueue,
}

/// Result alias for navigation.
pub type NavResult<T> = Result<T, NavError>;
