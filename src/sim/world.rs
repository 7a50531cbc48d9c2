//! Simulation context owning a surface and its balls
//!
//! Balls are stepped in id order. A ball observed as Halted has its
//! trajectory emitted (when recording) and is removed from the active set.

use glam::{Vec2, Vec3};

use super::rain::{RainSettings, scatter};
use super::state::BallState;
use super::surface::TriangulatedSurface;
use super::tick::Stepper;
use super::trajectory::{CurveBuilder, TrajectorySampler};
use crate::error::{SimError, SimResult};

/// Something observable that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Velocity was reflected on entering triangle `to`
    Bounced {
        ball: u32,
        from: Option<usize>,
        to: usize,
    },
    /// The ball left the surface bounds and was removed
    Halted {
        ball: u32,
        position: Vec3,
        elapsed: f32,
    },
    /// A control-point sequence went to the curve builder
    CurveEmitted { ball: u32, points: usize },
}

/// One ball and its trajectory recorder
#[derive(Debug, Clone)]
pub struct BallEntry {
    pub id: u32,
    pub state: BallState,
    sampler: TrajectorySampler,
}

impl BallEntry {
    pub fn sampler(&self) -> &TrajectorySampler {
        &self.sampler
    }
}

/// All balls rolling on one surface
#[derive(Debug, Clone)]
pub struct Simulation {
    surface: TriangulatedSurface,
    stepper: Stepper,
    sample_interval: f32,
    balls: Vec<BallEntry>,
    next_id: u32,
    time_ticks: u64,
}

impl Simulation {
    pub fn new(
        surface: TriangulatedSurface,
        stepper: Stepper,
        sample_interval: f32,
    ) -> SimResult<Self> {
        if !(sample_interval.is_finite() && sample_interval > 0.0) {
            return Err(SimError::InvalidSampleInterval(sample_interval));
        }
        Ok(Self {
            surface,
            stepper,
            sample_interval,
            balls: Vec::new(),
            next_id: 1,
            time_ticks: 0,
        })
    }

    pub fn surface(&self) -> &TriangulatedSurface {
        &self.surface
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    /// Balls still being stepped, in id order
    pub fn balls(&self) -> &[BallEntry] {
        &self.balls
    }

    pub fn ball(&self, id: u32) -> Option<&BallState> {
        self.balls.iter().find(|b| b.id == id).map(|b| &b.state)
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// True once every ball has halted
    pub fn is_finished(&self) -> bool {
        self.balls.is_empty()
    }

    /// Place an Active ball at `start` (x, z); returns its id
    pub fn spawn(&mut self, start: Vec2, radius: f32, record: bool) -> SimResult<u32> {
        let mut state = BallState::new(&self.surface, start, radius)?;
        state.start();
        let sampler = if record {
            TrajectorySampler::new(self.sample_interval)?
        } else {
            TrajectorySampler::disabled()
        };

        let id = self.next_id;
        self.next_id += 1;
        log::info!(
            "Ball {} spawned at {} (radius {}, recording {})",
            id,
            state.position,
            radius,
            record
        );
        self.balls.push(BallEntry { id, state, sampler });
        Ok(id)
    }

    /// Scatter recording balls over the surface; returns their ids
    pub fn spawn_rain(&mut self, rain: RainSettings, radius: f32) -> SimResult<Vec<u32>> {
        let starts = scatter(&self.surface, rain);
        starts
            .into_iter()
            .map(|start| self.spawn(start, radius, true))
            .collect()
    }

    /// Step every active ball once
    ///
    /// `elapsed` is the time credited to trajectory sampling for this tick;
    /// a fixed-rate driver passes the stepper's `dt`.
    pub fn tick<B: CurveBuilder + ?Sized>(&mut self, elapsed: f32, curves: &mut B) -> Vec<SimEvent> {
        let mut events = Vec::new();
        self.time_ticks += 1;

        for entry in &mut self.balls {
            if entry.state.is_moving() {
                let from = entry.state.previous.triangle;
                let report = self.stepper.tick(&mut entry.state, &self.surface);
                if report.bounced {
                    if let Some(to) = report.triangle {
                        events.push(SimEvent::Bounced {
                            ball: entry.id,
                            from,
                            to,
                        });
                    }
                }
                entry.sampler.advance(elapsed, &entry.state, &self.surface);
            }

            if entry.state.is_halted() {
                if let Some(points) =
                    entry
                        .sampler
                        .emit(entry.id, &entry.state, &self.surface, curves)
                {
                    events.push(SimEvent::CurveEmitted {
                        ball: entry.id,
                        points,
                    });
                }
                log::info!(
                    "Ball {} halted at {} after {:.2}s on the surface",
                    entry.id,
                    entry.state.position,
                    entry.state.elapsed
                );
                events.push(SimEvent::Halted {
                    ball: entry.id,
                    position: entry.state.position,
                    elapsed: entry.state.elapsed,
                });
            }
        }

        self.balls.retain(|b| !b.state.is_halted());
        events
    }

    /// Tick at the stepper's rate until every ball halts or `max_ticks` pass
    ///
    /// Returns the number of ticks run.
    pub fn run<B: CurveBuilder + ?Sized>(&mut self, max_ticks: u64, curves: &mut B) -> u64 {
        let dt = self.stepper.dt();
        let mut ticks = 0;
        while !self.is_finished() && ticks < max_ticks {
            self.tick(dt, curves);
            ticks += 1;
        }
        if !self.is_finished() {
            log::warn!(
                "{} balls still moving after {} ticks",
                self.balls.len(),
                ticks
            );
        }
        ticks
    }
}
