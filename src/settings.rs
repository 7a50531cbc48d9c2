//! Run configuration
//!
//! Loaded from a JSON file; every field has a default, so `{}` is a valid
//! configuration that drops one recording ball on the sample terrain.

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult, check_radius, check_timestep};
use crate::sim::{OffSurface, RainSettings, Simulation, Stepper, TriangulatedSurface};

/// Where the surface comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceSource {
    /// Built-in four-facet terrain
    #[default]
    Sample,
    /// Regular height grid, row-major heights
    Grid {
        #[serde(default)]
        origin: Vec2,
        spacing: f32,
        cols: usize,
        rows: usize,
        heights: Vec<f32>,
    },
    /// Vertex and index lists given in the settings file
    Inline {
        vertices: Vec<Vec3>,
        triangles: Vec<u32>,
    },
    /// Separate surface JSON file
    File { path: PathBuf },
}

impl SurfaceSource {
    pub fn build(&self) -> SimResult<TriangulatedSurface> {
        match self {
            SurfaceSource::Sample => Ok(TriangulatedSurface::sample_terrain()),
            SurfaceSource::Grid {
                origin,
                spacing,
                cols,
                rows,
                heights,
            } => TriangulatedSurface::from_height_grid(*origin, *spacing, *cols, *rows, heights),
            SurfaceSource::Inline {
                vertices,
                triangles,
            } => TriangulatedSurface::new(vertices.clone(), triangles.clone()),
            SurfaceSource::File { path } => TriangulatedSurface::load(path),
        }
    }
}

/// Simulation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Fixed timestep (seconds)
    pub dt: f32,
    /// Downward gravity magnitude
    pub gravity: f32,
    /// Ball radius, unless `ball_scale` is set
    pub ball_radius: f32,
    /// Visual diameter of the ball; overrides `ball_radius` with scale / 2
    pub ball_scale: Option<f32>,
    /// Time between periodic trajectory control points
    pub sample_interval: f32,
    /// Record and emit trajectories for `starts` balls (rain balls always record)
    pub record_trajectories: bool,
    /// Behavior when no triangle contains the ball
    pub off_surface: OffSurface,
    /// Runner gives up after this many ticks
    pub max_ticks: u64,
    /// Start coordinates (x, z) for individually placed balls
    pub starts: Vec<Vec2>,
    /// Optional scatter of many recording balls
    pub rain: Option<RainSettings>,
    pub surface: SurfaceSource,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            gravity: GRAVITY,
            ball_radius: DEFAULT_BALL_RADIUS,
            ball_scale: None,
            sample_interval: SAMPLE_INTERVAL,
            record_trajectories: true,
            off_surface: OffSurface::default(),
            max_ticks: MAX_TICKS,
            starts: vec![Vec2::new(0.06, 0.03)],
            rain: None,
            surface: SurfaceSource::default(),
        }
    }
}

impl SimSettings {
    /// Read and validate a JSON settings file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Effective ball radius
    pub fn radius(&self) -> f32 {
        match self.ball_scale {
            Some(scale) => scale / 2.0,
            None => self.ball_radius,
        }
    }

    /// Check scalar preconditions (surface and starts are checked in `build`)
    pub fn validate(&self) -> SimResult<()> {
        check_timestep(self.dt)?;
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(SimError::InvalidGravity(self.gravity));
        }
        check_radius(self.radius())?;
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(SimError::InvalidSampleInterval(self.sample_interval));
        }
        Ok(())
    }

    /// Build the surface, stepper and all configured balls
    pub fn build(&self) -> SimResult<Simulation> {
        self.validate()?;
        let surface = self.surface.build()?;
        let stepper =
            Stepper::new(self.dt, self.gravity, &surface)?.with_off_surface(self.off_surface);
        let mut sim = Simulation::new(surface, stepper, self.sample_interval)?;

        let radius = self.radius();
        for start in &self.starts {
            sim.spawn(*start, radius, self.record_trajectories)?;
        }
        if let Some(rain) = self.rain {
            sim.spawn_rain(rain, radius)?;
        }
        Ok(sim)
    }
}
