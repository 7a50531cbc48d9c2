//! Fixed timestep ball update
//!
//! One call advances one ball by `dt`: locate the facet under the ball,
//! integrate slope-constrained gravity, bounce on facet transitions, push the
//! ball back above the surface, then check the bounds exit.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::bounds::BoundsGuard;
use super::collision::{collision_normal, reflect};
use super::state::{BallState, Contact};
use super::surface::TriangulatedSurface;
use crate::consts::FREE_FALL_FLOOR;
use crate::error::{SimError, SimResult, check_timestep};
use crate::ground;

/// What the stepper does with a ball that no triangle contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OffSurface {
    /// Leave position and velocity untouched
    Hold,
    /// Integrate plain gravity until the free-fall floor
    #[default]
    FreeFall,
}

/// Summary of a single tick, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Triangle containing the ball at the start of the tick
    pub triangle: Option<usize>,
    /// Velocity was reflected at a triangle transition
    pub bounced: bool,
    /// Position was snapped back above the surface
    pub corrected: bool,
    /// The ball left the bounds this tick
    pub halted: bool,
}

/// Gravity projected into the tangent plane of a facet with unit `normal`
///
/// Independent of the normal's sign; zero on a level facet.
#[inline]
pub fn slope_acceleration(normal: Vec3, gravity: f32) -> Vec3 {
    Vec3::new(
        normal.x * normal.y,
        normal.y * normal.y - 1.0,
        normal.z * normal.y,
    ) * gravity
}

/// Snap the ball up if its bottom dipped under the surface
///
/// Returns true if the position changed. Applying it twice in a row is the
/// same as applying it once.
pub fn correct_penetration(ball: &mut BallState, surface: &TriangulatedSurface) -> bool {
    let ground_pos = ground(ball.position);
    let height = surface.height_at(ground_pos);
    if ball.position.y - ball.radius < height {
        let corrected = Vec3::new(ball.position.x, height, ball.position.z) + Vec3::Y * ball.radius;
        let changed = corrected != ball.position;
        ball.position = corrected;
        changed
    } else {
        false
    }
}

/// Advances balls over one surface with a fixed timestep and gravity
#[derive(Debug, Clone, Copy)]
pub struct Stepper {
    dt: f32,
    gravity: f32,
    off_surface: OffSurface,
    guard: BoundsGuard,
}

impl Stepper {
    /// Validate `dt` and `gravity` and capture the surface bounds
    pub fn new(dt: f32, gravity: f32, surface: &TriangulatedSurface) -> SimResult<Self> {
        let dt = check_timestep(dt)?;
        if !(gravity.is_finite() && gravity >= 0.0) {
            return Err(SimError::InvalidGravity(gravity));
        }
        Ok(Self {
            dt,
            gravity,
            off_surface: OffSurface::default(),
            guard: BoundsGuard::new(surface.bounds()),
        })
    }

    pub fn with_off_surface(mut self, off_surface: OffSurface) -> Self {
        self.off_surface = off_surface;
        self
    }

    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn guard(&self) -> &BoundsGuard {
        &self.guard
    }

    /// Advance `ball` by one fixed timestep
    ///
    /// Does nothing unless the ball is Active.
    pub fn tick(&self, ball: &mut BallState, surface: &TriangulatedSurface) -> TickReport {
        let mut report = TickReport::default();
        if !ball.is_moving() {
            return report;
        }

        let dt = self.dt;
        match surface.locate(ground(ball.position)) {
            Some(hit) => {
                report.triangle = Some(hit.triangle);
                ball.elapsed += dt;

                let normal = surface.triangle(hit.triangle).normal();
                ball.contact = Contact::on(hit.triangle, normal);
                let accel = slope_acceleration(normal, self.gravity);

                ball.velocity += accel * dt;
                ball.position += ball.velocity * dt;

                if ball.crossed_triangle() {
                    let n = collision_normal(ball.previous.normal, normal);
                    let reflected = reflect(ball.velocity, n);
                    ball.velocity = reflected + accel * dt;
                    ball.position += ball.velocity * dt;
                    report.bounced = true;
                    log::debug!(
                        "Ball crossed {:?} -> {} at {}, v = {}",
                        ball.previous.triangle,
                        hit.triangle,
                        ball.position,
                        ball.velocity
                    );
                }

                ball.commit_contact();
            }
            None => {
                if ball.contact.triangle.is_some() {
                    log::debug!("Ball left the triangulated region at {}", ball.position);
                }
                ball.contact = Contact::NONE;
                if self.off_surface == OffSurface::FreeFall && ball.position.y > FREE_FALL_FLOOR {
                    ball.velocity += Vec3::NEG_Y * self.gravity * dt;
                    ball.position += ball.velocity * dt;
                }
            }
        }

        report.corrected = correct_penetration(ball, surface);

        if !self.guard.allows(ball.position) {
            ball.halt();
            report.halted = true;
        }

        log::trace!(
            "tick: p = {}, v = {}, tri = {:?}",
            ball.position,
            ball.velocity,
            ball.contact.triangle
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_BALL_RADIUS, GRAVITY, SIM_DT};
    use glam::Vec2;
    use proptest::prelude::*;

    const EPS: f32 = 1e-5;

    fn slope() -> TriangulatedSurface {
        TriangulatedSurface::new(
            vec![
                Vec3::new(0.0, 0.1, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    fn flat() -> TriangulatedSurface {
        TriangulatedSurface::new(
            vec![
                Vec3::new(-10.0, 0.5, -10.0),
                Vec3::new(30.0, 0.5, -10.0),
                Vec3::new(-10.0, 0.5, 30.0),
            ],
            vec![0, 2, 1],
        )
        .unwrap()
    }

    fn active_ball(surface: &TriangulatedSurface, start: Vec2) -> BallState {
        let mut ball = BallState::new(surface, start, DEFAULT_BALL_RADIUS).unwrap();
        ball.start();
        ball
    }

    #[test]
    fn test_rejects_bad_config() {
        let surface = slope();
        assert!(matches!(
            Stepper::new(0.0, GRAVITY, &surface),
            Err(SimError::InvalidTimestep(_))
        ));
        assert!(matches!(
            Stepper::new(-0.02, GRAVITY, &surface),
            Err(SimError::InvalidTimestep(_))
        ));
        assert!(matches!(
            Stepper::new(SIM_DT, f32::NAN, &surface),
            Err(SimError::InvalidGravity(_))
        ));
    }

    #[test]
    fn test_level_facet_has_no_acceleration() {
        assert_eq!(slope_acceleration(Vec3::Y, GRAVITY), Vec3::ZERO);
        assert_eq!(slope_acceleration(Vec3::NEG_Y, GRAVITY), Vec3::ZERO);
    }

    #[test]
    fn test_acceleration_points_downhill() {
        let surface = slope();
        let n = surface.triangle(0).normal();
        let a = slope_acceleration(n, GRAVITY);
        // Height falls with x and z, so the ball heads toward +x, +z
        assert!(a.x > 0.0 && a.z > 0.0 && a.y < 0.0);
        // Tangent to the facet regardless of normal sign
        assert!(a.dot(n).abs() < 1e-4);
        assert!((slope_acceleration(-n, GRAVITY) - a).length() < EPS);
    }

    #[test]
    fn test_idle_ball_does_not_move() {
        let surface = slope();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface).unwrap();
        let mut ball = BallState::new(&surface, Vec2::new(0.2, 0.2), DEFAULT_BALL_RADIUS).unwrap();
        let before = ball.position;
        let report = stepper.tick(&mut ball, &surface);
        assert_eq!(report, TickReport::default());
        assert_eq!(ball.position, before);
    }

    #[test]
    fn test_first_contact_bounces() {
        let surface = slope();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface).unwrap();
        let mut ball = active_ball(&surface, Vec2::new(0.2, 0.2));

        let report = stepper.tick(&mut ball, &surface);
        assert_eq!(report.triangle, Some(0));
        assert!(report.bounced);
        assert!((ball.elapsed - SIM_DT).abs() < EPS);

        // Velocity is tangent, so the bounce leaves it alone and adds one more
        // step of slope acceleration
        let accel = slope_acceleration(surface.triangle(0).normal(), GRAVITY);
        assert!((ball.velocity - accel * 2.0 * SIM_DT).length() < 1e-4);

        let report = stepper.tick(&mut ball, &surface);
        assert!(!report.bounced);
        assert_eq!(ball.previous.triangle, Some(0));
    }

    #[test]
    fn test_flat_keeps_horizontal_velocity() {
        let surface = flat();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface).unwrap();
        let mut ball = active_ball(&surface, Vec2::ZERO);
        ball.velocity = Vec3::new(0.5, 0.0, -0.25);

        for _ in 0..100 {
            stepper.tick(&mut ball, &surface);
            assert!((ball.velocity.x - 0.5).abs() < EPS);
            assert!((ball.velocity.z + 0.25).abs() < EPS);
        }
        assert!((ball.position.y - (0.5 + DEFAULT_BALL_RADIUS)).abs() < EPS);
    }

    #[test]
    fn test_correction_is_idempotent() {
        let surface = slope();
        let mut ball = active_ball(&surface, Vec2::new(0.3, 0.1));
        ball.position.y = -1.0;

        assert!(correct_penetration(&mut ball, &surface));
        let once = ball.position;
        correct_penetration(&mut ball, &surface);
        assert_eq!(ball.position, once);

        let h = surface.height_at(ground(once));
        assert!((once.y - (h + DEFAULT_BALL_RADIUS)).abs() < EPS);
    }

    #[test]
    fn test_correction_leaves_airborne_ball() {
        let surface = slope();
        let mut ball = active_ball(&surface, Vec2::new(0.3, 0.1));
        ball.position.y = 5.0;
        assert!(!correct_penetration(&mut ball, &surface));
        assert_eq!(ball.position.y, 5.0);
    }

    #[test]
    fn test_hold_freezes_off_surface() {
        let surface = slope();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface)
            .unwrap()
            .with_off_surface(OffSurface::Hold);
        // Inside the bounds but past the hypotenuse
        let mut ball = active_ball(&surface, Vec2::new(0.8, 0.8));
        ball.velocity = Vec3::new(1.0, 0.0, 0.0);
        let before = ball.position;

        let report = stepper.tick(&mut ball, &surface);
        assert_eq!(report.triangle, None);
        assert_eq!(ball.position, before);
        assert!(ball.is_moving());
        assert_eq!(ball.elapsed, 0.0);
    }

    #[test]
    fn test_free_fall_carries_ball_out() {
        let surface = slope();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface).unwrap();
        let mut ball = active_ball(&surface, Vec2::new(0.8, 0.8));
        ball.velocity = Vec3::new(1.0, 0.0, 0.0);

        let mut ticks = 0;
        while ball.is_moving() && ticks < 100 {
            stepper.tick(&mut ball, &surface);
            // Off the mesh the floor is height 0
            assert!(ball.position.y >= DEFAULT_BALL_RADIUS - EPS);
            ticks += 1;
        }
        assert!(ball.is_halted());
        assert!(ball.position.x > 1.0);
    }

    #[test]
    fn test_degenerate_triangle_is_skipped() {
        let surface = TriangulatedSurface::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.5, 0.0, 0.5),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![0, 1, 2, 0, 3, 4],
        )
        .unwrap();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface).unwrap();
        let mut ball = active_ball(&surface, Vec2::new(0.25, 0.25));

        let report = stepper.tick(&mut ball, &surface);
        assert_eq!(report.triangle, Some(1));
        assert!(ball.position.is_finite());
        assert!(ball.velocity.is_finite());
    }

    #[test]
    fn test_slope_run_ends_above_surface() {
        let surface = slope();
        let stepper = Stepper::new(SIM_DT, GRAVITY, &surface).unwrap();
        let mut ball = active_ball(&surface, Vec2::new(0.2, 0.2));

        // Generous cap: well over the time to cross a unit footprint
        let max_ticks = 10_000;
        let mut ticks = 0;
        while ball.is_moving() && ticks < max_ticks {
            stepper.tick(&mut ball, &surface);
            let h = surface.height_at(ground(ball.position));
            assert!(
                ball.position.y - ball.radius >= h - 1e-4,
                "tick {ticks}: bottom {} under surface {h}",
                ball.position.y - ball.radius
            );
            assert!(ball.position.is_finite() && ball.velocity.is_finite());
            ticks += 1;
        }

        assert!(ball.is_halted(), "ball still moving after {ticks} ticks");
        let exit = ground(ball.position);
        assert!(exit.x > 1.0 || exit.y > 1.0);
        // Halted balls ignore further ticks
        let frozen = ball.position;
        assert_eq!(stepper.tick(&mut ball, &surface), TickReport::default());
        assert_eq!(ball.position, frozen);
    }

    proptest! {
        #[test]
        fn correction_idempotent_anywhere(x in -0.2f32..1.2, z in -0.2f32..1.2, y in -1.0f32..1.0) {
            let surface = slope();
            let mut ball = BallState::new(&surface, Vec2::new(0.1, 0.1), DEFAULT_BALL_RADIUS).unwrap();
            ball.position = Vec3::new(x, y, z);
            correct_penetration(&mut ball, &surface);
            let once = ball.position;
            correct_penetration(&mut ball, &surface);
            prop_assert_eq!(ball.position, once);
        }
    }
}
