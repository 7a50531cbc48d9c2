//! Collision response at triangle transitions
//!
//! Crossing from one facet to the next is treated as an instantaneous elastic
//! bounce off the plane halfway between the two facet normals.

use glam::Vec3;

/// Unit normal of the collision plane between two facets
///
/// On first contact `previous` is zero and this reduces to `current`. Two
/// opposite normals (mixed winding on a flat joint) give zero, which makes
/// the reflection a no-op.
#[inline]
pub fn collision_normal(previous: Vec3, current: Vec3) -> Vec3 {
    (previous + current).normalize_or_zero()
}

/// Reflect velocity off a plane with unit normal `n`
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
