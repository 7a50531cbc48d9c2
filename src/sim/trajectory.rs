//! Trajectory sampling
//!
//! While a ball moves, its ground-projected position is recorded once per
//! sampling interval of elapsed time. When the ball halts the recorded
//! control points are handed to a [`CurveBuilder`] exactly once.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::BallState;
use super::surface::TriangulatedSurface;
use crate::error::{SimError, SimResult};
use crate::ground;

/// Receives finished control-point sequences (at least one point each)
pub trait CurveBuilder {
    fn build_curve(&mut self, ball: u32, control_points: Vec<Vec3>);
}

/// A finished control-point sequence, as handed off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub ball: u32,
    pub control_points: Vec<Vec3>,
}

/// Collects every emitted trajectory in emission order
impl CurveBuilder for Vec<Trajectory> {
    fn build_curve(&mut self, ball: u32, control_points: Vec<Vec3>) {
        self.push(Trajectory {
            ball,
            control_points,
        });
    }
}

/// Control point for the ball's current spot: surface height under it, or
/// the ball's own height when the surface gives nothing positive, raised by
/// the radius
pub fn control_point(ball: &BallState, surface: &TriangulatedSurface) -> Vec3 {
    let mut height = surface.height_at(ground(ball.position));
    if !(height.is_finite() && height > 0.0) {
        height = ball.position.y;
    }
    Vec3::new(ball.position.x, height, ball.position.z) + Vec3::Y * ball.radius
}

/// Per-ball control-point recorder
#[derive(Debug, Clone)]
pub struct TrajectorySampler {
    interval: f32,
    timer: f32,
    enabled: bool,
    emitted: bool,
    points: Vec<Vec3>,
}

impl TrajectorySampler {
    pub fn new(interval: f32) -> SimResult<Self> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(SimError::InvalidSampleInterval(interval));
        }
        Ok(Self {
            interval,
            timer: 0.0,
            enabled: true,
            emitted: false,
            points: Vec::new(),
        })
    }

    /// A sampler that never records or emits
    pub fn disabled() -> Self {
        Self {
            interval: f32::INFINITY,
            timer: 0.0,
            enabled: false,
            emitted: false,
            points: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_emitted(&self) -> bool {
        self.emitted
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Accumulate `elapsed` time; record a point once a full interval passed
    ///
    /// Returns true if a point was recorded. The timer restarts from zero
    /// after each sample.
    pub fn advance(
        &mut self,
        elapsed: f32,
        ball: &BallState,
        surface: &TriangulatedSurface,
    ) -> bool {
        if !self.enabled || self.emitted {
            return false;
        }
        self.timer += elapsed;
        if self.timer >= self.interval {
            self.capture(ball, surface);
            self.timer = 0.0;
            true
        } else {
            false
        }
    }

    /// Record a point right now
    pub fn capture(&mut self, ball: &BallState, surface: &TriangulatedSurface) {
        self.points.push(control_point(ball, surface));
    }

    /// Final capture and handoff of the recorded points
    ///
    /// Returns `None` if sampling is disabled or the points were already
    /// handed off.
    pub fn finish(
        &mut self,
        ball: &BallState,
        surface: &TriangulatedSurface,
    ) -> Option<Vec<Vec3>> {
        if !self.enabled || self.emitted {
            return None;
        }
        self.capture(ball, surface);
        self.emitted = true;
        Some(std::mem::take(&mut self.points))
    }

    /// [`finish`](Self::finish) straight into a curve builder
    ///
    /// Returns the number of control points handed off, if any.
    pub fn emit<B: CurveBuilder + ?Sized>(
        &mut self,
        id: u32,
        ball: &BallState,
        surface: &TriangulatedSurface,
        builder: &mut B,
    ) -> Option<usize> {
        let points = self.finish(ball, surface)?;
        let count = points.len();
        log::info!("Ball {} trajectory: {} control points", id, count);
        builder.build_curve(id, points);
        Some(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_BALL_RADIUS;
    use glam::Vec2;

    const EPS: f32 = 1e-5;

    fn flat() -> TriangulatedSurface {
        TriangulatedSurface::new(
            vec![
                Vec3::new(0.0, 0.2, 0.0),
                Vec3::new(4.0, 0.2, 0.0),
                Vec3::new(0.0, 0.2, 4.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    fn ball(surface: &TriangulatedSurface) -> BallState {
        let mut ball = BallState::new(surface, Vec2::new(0.5, 0.5), DEFAULT_BALL_RADIUS).unwrap();
        ball.start();
        ball
    }

    #[test]
    fn test_rejects_bad_interval() {
        assert!(matches!(
            TrajectorySampler::new(0.0),
            Err(SimError::InvalidSampleInterval(_))
        ));
        assert!(TrajectorySampler::new(f32::NAN).is_err());
    }

    #[test]
    fn test_three_and_a_half_units_gives_four_points() {
        let surface = flat();
        let ball = ball(&surface);
        let mut sampler = TrajectorySampler::new(1.0).unwrap();

        // 14 ticks of 0.25 are exactly 3.5 time units
        let periodic = (0..14)
            .filter(|_| sampler.advance(0.25, &ball, &surface))
            .count();
        assert_eq!(periodic, 3);

        let mut curves: Vec<Trajectory> = Vec::new();
        assert_eq!(sampler.emit(7, &ball, &surface, &mut curves), Some(4));
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].ball, 7);
        assert_eq!(curves[0].control_points.len(), 4);
    }

    #[test]
    fn test_fixed_step_sampling() {
        let surface = flat();
        let ball = ball(&surface);
        let mut sampler = TrajectorySampler::new(1.0).unwrap();
        for _ in 0..175 {
            sampler.advance(0.02, &ball, &surface);
        }
        assert_eq!(sampler.points().len(), 3);
        assert_eq!(sampler.finish(&ball, &surface).map(|p| p.len()), Some(4));
    }

    #[test]
    fn test_emits_once() {
        let surface = flat();
        let ball = ball(&surface);
        let mut sampler = TrajectorySampler::new(1.0).unwrap();
        let mut curves: Vec<Trajectory> = Vec::new();

        assert_eq!(sampler.emit(1, &ball, &surface, &mut curves), Some(1));
        assert_eq!(sampler.emit(1, &ball, &surface, &mut curves), None);
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].control_points.len(), 1);
        assert!(!sampler.advance(5.0, &ball, &surface));
    }

    #[test]
    fn test_disabled_never_emits() {
        let surface = flat();
        let ball = ball(&surface);
        let mut sampler = TrajectorySampler::disabled();
        assert!(!sampler.advance(10.0, &ball, &surface));
        assert!(sampler.finish(&ball, &surface).is_none());
        assert!(sampler.points().is_empty());
    }

    #[test]
    fn test_control_point_on_surface() {
        let surface = flat();
        let ball = ball(&surface);
        let p = control_point(&ball, &surface);
        assert!((p - Vec3::new(0.5, 0.2 + DEFAULT_BALL_RADIUS, 0.5)).length() < EPS);
    }

    #[test]
    fn test_control_point_falls_back_to_ball_height() {
        let surface = flat();
        let mut ball = ball(&surface);
        // Past the hypotenuse the surface query misses and returns 0
        ball.position = Vec3::new(3.0, 0.7, 3.0);
        let p = control_point(&ball, &surface);
        assert!((p.y - (0.7 + DEFAULT_BALL_RADIUS)).abs() < EPS);
    }
}
