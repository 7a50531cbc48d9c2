//! Deterministic simulation module
//!
//! Everything that moves a ball lives here. This module must stay pure:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (triangle list order, ball id order)
//! - No rendering, scheduling or platform dependencies

pub mod bounds;
pub mod collision;
pub mod locate;
pub mod rain;
pub mod state;
pub mod surface;
pub mod tick;
pub mod trajectory;
pub mod world;

pub use bounds::{Bounds, BoundsGuard};
pub use collision::{collision_normal, reflect};
pub use locate::{GridIndex, SurfaceHit, barycentric, is_inside};
pub use rain::{RainSettings, scatter};
pub use state::{BallState, Contact, Phase};
pub use surface::{SurfaceData, Triangle, TriangulatedSurface};
pub use tick::{OffSurface, Stepper, TickReport, correct_penetration, slope_acceleration};
pub use trajectory::{CurveBuilder, Trajectory, TrajectorySampler, control_point};
pub use world::{BallEntry, SimEvent, Simulation};
