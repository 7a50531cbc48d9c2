//! Seeded scattering of many balls over a surface

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::surface::TriangulatedSurface;

/// Random draws per requested ball before giving up
const ATTEMPTS_PER_BALL: usize = 64;

/// How many balls to drop and the seed for their positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainSettings {
    pub count: usize,
    pub seed: u64,
}

/// Up to `count` start coordinates that land on some triangle
///
/// Positions are drawn uniformly over the surface bounds and kept only when
/// located; the same seed always gives the same list. Fewer than `count` are
/// returned if the surface covers little of its bounds.
pub fn scatter(surface: &TriangulatedSurface, rain: RainSettings) -> Vec<Vec2> {
    let bounds = surface.bounds();
    let mut rng = Pcg32::seed_from_u64(rain.seed);
    let mut starts = Vec::with_capacity(rain.count);

    for _ in 0..rain.count.saturating_mul(ATTEMPTS_PER_BALL) {
        if starts.len() == rain.count {
            break;
        }
        let p = Vec2::new(
            rng.random_range(bounds.min.x..=bounds.max.x),
            rng.random_range(bounds.min.y..=bounds.max.y),
        );
        if surface.locate(p).is_some() {
            starts.push(p);
        }
    }

    if starts.len() < rain.count {
        log::warn!(
            "Rain placed {} of {} balls on the surface",
            starts.len(),
            rain.count
        );
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_scatter_is_deterministic() {
        let surface = TriangulatedSurface::sample_terrain();
        let rain = RainSettings { count: 20, seed: 42 };
        assert_eq!(scatter(&surface, rain), scatter(&surface, rain));
        assert_ne!(
            scatter(&surface, rain),
            scatter(&surface, RainSettings { count: 20, seed: 43 })
        );
    }

    #[test]
    fn test_scatter_lands_on_surface() {
        let surface = TriangulatedSurface::new(
            vec![
                Vec3::new(0.0, 0.1, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap();
        let starts = scatter(&surface, RainSettings { count: 50, seed: 7 });
        assert_eq!(starts.len(), 50);
        assert!(starts.iter().all(|p| surface.locate(*p).is_some()));
    }

    #[test]
    fn test_scatter_zero() {
        let surface = TriangulatedSurface::sample_terrain();
        assert!(scatter(&surface, RainSettings { count: 0, seed: 1 }).is_empty());
    }
}
