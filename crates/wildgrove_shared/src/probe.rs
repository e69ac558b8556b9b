//! # World Oracles
//!
//! The host owns physics. Streaming and navigation ask it two questions:
//! how high is the ground here, and is this volume blocked.

use std::sync::Arc;

use crate::math::Vec3;

/// Ground-height query against walkable terrain.
pub trait GroundProbe {
    /// Height of the ground surface below `(x, z)`.
    ///
    /// `max_height` is where a downward probe would start; surfaces above
    /// it are ignored. Returns `0.0` when no ground is found.
    fn ground_height(&self, x: f32, z: f32, max_height: f32) -> f32;
}

/// Volume query against water, trees and other blocking geometry.
pub trait ObstacleProbe {
    /// Returns true if a sphere of `radius` at `center` touches an obstacle.
    fn is_obstructed(&self, center: Vec3, radius: f32) -> bool;
}

impl<T: GroundProbe + ?Sized> GroundProbe for &T {
    fn ground_height(&self, x: f32, z: f32, max_height: f32) -> f32 {
        (**self).ground_height(x, z, max_height)
    }
}

impl<T: GroundProbe + ?Sized> GroundProbe for Arc<T> {
    fn ground_height(&self, x: f32, z: f32, max_height: f32) -> f32 {
        (**self).ground_height(x, z, max_height)
    }
}

impl<T: ObstacleProbe + ?Sized> ObstacleProbe for &T {
    fn is_obstructed(&self, center: Vec3, radius: f32) -> bool {
        (**self).is_obstructed(center, radius)
    }
}

impl<T: ObstacleProbe + ?Sized> ObstacleProbe for Arc<T> {
    fn is_obstructed(&self, center: Vec3, radius: f32) -> bool {
        (**self).is_obstructed(center, radius)
    }
}

/// Flat ground at a fixed height with nothing on it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatGround {
    /// Height returned for every query.
    pub height: f32,
}

impl GroundProbe for FlatGround {
    fn ground_height(&self, _x: f32, _z: f32, max_height: f32) -> f32 {
        if self.height > max_height {
            0.0
        } else {
            self.height
        }
    }
}

impl ObstacleProbe for FlatGround {
    fn is_obstructed(&self, _center: Vec3, _radius: f32) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_through<G: GroundProbe>(probe: G) -> f32 {
        probe.ground_height(1.0, 2.0, 100.0)
    }

    #[test]
    fn test_flat_ground_above_probe_start_is_missed() {
        let ground = FlatGround { height: 12.0 };
        assert_eq!(ground.ground_height(0.0, 0.0, 50.0), 12.0);
        assert_eq!(ground.ground_height(0.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_references_and_arcs_forward() {
        let ground = FlatGround { height: 3.0 };
        assert_eq!(probe_through(&ground), 3.0);
        assert_eq!(probe_through(Arc::new(ground)), 3.0);
        assert!(!(&ground).is_obstructed(Vec3::ZERO, 1.0));
    }
}
