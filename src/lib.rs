//! Slope Roll - a ball rolling across a triangulated height field
//!
//! Core modules:
//! - `sim`: Deterministic simulation (surface queries, stepping, trajectories)
//! - `settings`: Run configuration loaded from JSON
//! - `error`: Configuration errors reported to the caller

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use settings::SimSettings;

use glam::{Vec2, Vec3};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const SIM_DT: f32 = 0.02;
    /// Downward gravity magnitude (m/s²)
    pub const GRAVITY: f32 = 9.81;

    /// Ball radius when no visual scale is given
    pub const DEFAULT_BALL_RADIUS: f32 = 0.015;

    /// Time between two periodic trajectory control points
    pub const SAMPLE_INTERVAL: f32 = 1.0;

    /// A ball falling off the surface stops integrating below this height
    pub const FREE_FALL_FLOOR: f32 = -20.0;

    /// Safety cap on ticks for the native runner
    pub const MAX_TICKS: u64 = 100_000;
}

/// Project a world position onto the horizontal (x, z) plane
#[inline]
pub fn ground(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}

/// Lift a horizontal (x, z) coordinate to a world position at height `y`
#[inline]
pub fn lift(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, p.y)
}
