//! Error types for simulation setup.
//!
//! Query misses and degenerate triangles never show up here; they are
//! resolved inside the simulation. Only invalid configuration is reported.

use thiserror::Error;

/// Result type alias for simulation setup.
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur while configuring a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Fixed timestep must be finite and positive.
    #[error("invalid timestep {0}: must be finite and > 0")]
    InvalidTimestep(f32),

    /// Gravity magnitude must be finite and non-negative.
    #[error("invalid gravity {0}: must be finite and >= 0")]
    InvalidGravity(f32),

    /// Ball radius must be finite and positive.
    #[error("invalid ball radius {0}: must be finite and > 0")]
    InvalidRadius(f32),

    /// Trajectory sampling interval must be finite and positive.
    #[error("invalid sample interval {0}: must be finite and > 0")]
    InvalidSampleInterval(f32),

    /// Surface has no vertices or no triangles.
    #[error("surface has no vertices or no triangles")]
    EmptySurface,

    /// Triangle index list length is not a multiple of three.
    #[error("triangle index list has {0} entries, expected a multiple of 3")]
    TriangleListLength(usize),

    /// A triangle references a vertex that does not exist.
    #[error("triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    /// A vertex has a NaN or infinite coordinate.
    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),

    /// Height grid dimensions do not match its data.
    #[error("invalid height grid: {0}")]
    InvalidGrid(String),

    /// Start coordinate lies outside the surface's horizontal extent.
    #[error("start position ({x}, {z}) is outside the surface bounds")]
    StartOutsideSurface { x: f32, z: f32 },

    /// Settings or surface file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or surface file is not valid JSON for its schema.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Create an invalid grid error.
    #[must_use]
    pub fn invalid_grid(details: impl Into<String>) -> Self {
        Self::InvalidGrid(details.into())
    }
}

/// Reject timesteps that would stall or reverse the simulation.
pub fn check_timestep(dt: f32) -> SimResult<f32> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(SimError::InvalidTimestep(dt))
    }
}

/// Reject radii that cannot describe a ball.
pub fn check_radius(radius: f32) -> SimResult<f32> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(SimError::InvalidRadius(radius))
    }
}
