//! Horizontal extent of a surface and the bounds-exit halt condition

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::ground;

/// Axis-aligned rectangle on the horizontal (x, z) plane
///
/// `min.y`/`max.y` hold the z range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Min/max x and z over all points, or `None` for an empty set
    pub fn of_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = ground(*first);
        let (min, max) = rest
            .iter()
            .map(|p| ground(*p))
            .fold((start, start), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    #[inline]
    pub fn extent(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Grow the rectangle by `pad` on every side
    pub fn expanded(&self, pad: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(pad),
            max: self.max + Vec2::splat(pad),
        }
    }
}

/// Halts a ball once its horizontal position leaves the surface extent
///
/// The extent is computed once, when the surface is built; this is the only
/// way active motion ends.
#[derive(Debug, Clone, Copy)]
pub struct BoundsGuard {
    bounds: Bounds,
}

impl BoundsGuard {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// True when the ball should keep moving
    #[inline]
    pub fn allows(&self, position: Vec3) -> bool {
        self.bounds.contains(ground(position))
    }
}
