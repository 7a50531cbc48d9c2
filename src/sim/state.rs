//! Ball simulation state
//!
//! Everything the stepper mutates for one ball lives here. The per-triangle
//! "previous" shadow values are kept as a second [`Contact`] slot that is
//! committed once at the end of a located tick.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::surface::TriangulatedSurface;
use crate::error::{SimError, SimResult, check_radius};
use crate::lift;

/// Lifecycle of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Placed on the surface, not yet stepping
    Idle,
    /// Stepped every tick
    Active,
    /// Left the surface bounds. Terminal.
    Halted,
}

/// Triangle the ball is resting on and that triangle's unit normal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub triangle: Option<usize>,
    /// Zero when `triangle` is `None`
    pub normal: Vec3,
}

impl Contact {
    pub const NONE: Self = Self {
        triangle: None,
        normal: Vec3::ZERO,
    };

    pub fn on(triangle: usize, normal: Vec3) -> Self {
        Self {
            triangle: Some(triangle),
            normal,
        }
    }
}

/// A point-mass ball on the surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Contact found this tick
    pub contact: Contact,
    /// Contact committed at the end of the last located tick
    pub previous: Contact,
    pub radius: f32,
    pub phase: Phase,
    /// Simulated time spent inside some triangle
    pub elapsed: f32,
}

impl BallState {
    /// Place a ball resting on the surface at `start` (x, z)
    pub fn new(surface: &TriangulatedSurface, start: Vec2, radius: f32) -> SimResult<Self> {
        let radius = check_radius(radius)?;
        if !surface.bounds().contains(start) {
            return Err(SimError::StartOutsideSurface {
                x: start.x,
                z: start.y,
            });
        }

        let height = surface.height_at(start);
        Ok(Self {
            position: lift(start, height + radius),
            velocity: Vec3::ZERO,
            contact: Contact::NONE,
            previous: Contact::NONE,
            radius,
            phase: Phase::Idle,
            elapsed: 0.0,
        })
    }

    /// Radius of a ball whose visual diameter is `scale`
    #[inline]
    pub fn radius_from_scale(scale: f32) -> f32 {
        scale / 2.0
    }

    /// Idle -> Active. No effect in any other phase.
    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Active;
        }
    }

    /// Active -> Halted. Never reverts.
    pub fn halt(&mut self) {
        if self.phase == Phase::Active {
            self.phase = Phase::Halted;
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.phase == Phase::Active
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Whether the ball changed triangle since the last committed contact
    #[inline]
    pub fn crossed_triangle(&self) -> bool {
        self.contact.triangle != self.previous.triangle
    }

    /// Shift this tick's contact into the previous slot
    #[inline]
    pub fn commit_contact(&mut self) {
        self.previous = self.contact;
    }
}
