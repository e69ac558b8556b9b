//! # Wildgrove Shared
//!
//! Types used by both terrain streaming and navigation.
//!
//! ## Rule
//!
//! This crate must never depend on a physics engine or a renderer. Ground
//! and obstacle queries are expressed as traits the host implements; the
//! navigation crate only ever sees those traits.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod math;
pub mod probe;

pub use error::{ensure_positive, ConfigError, ConfigResult};
pub use math::{Vec2, Vec3};
pub use probe::{FlatGround, GroundProbe, ObstacleProbe};
