//! Synthetic runner used for demos and tests.

use std::f64::consts::TAU;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::{FixStream, LocationSource};
use crate::clock::{Clock, MonotonicClock};
use crate::config::SimulationConfig;
use crate::models::{Coordinate, LocationFix};

/// Rough metres per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug)]
struct SimState {
    position: Coordinate,
    speed_mps: f64,
    target_speed_mps: f64,
    heading: f64,
    running: bool,
    /// Bumped on every start/stop so streams of earlier runs end.
    generation: u64,
    rng: StdRng,
}

struct SimInner {
    state: Mutex<SimState>,
    config: SimulationConfig,
    clock: Arc<dyn Clock>,
}

impl SimInner {
    /// Advances one tick of the given run. `None` once that run is over.
    fn tick(&self, generation: u64) -> Option<LocationFix> {
        let mut state = self.state.lock();
        if !state.running || state.generation != generation {
            return None;
        }
        advance(&mut state, &self.config);
        Some(LocationFix::new(
            state.position,
            self.clock.now_millis(),
            state.speed_mps,
        ))
    }
}

/// One simulation step: ease towards the target speed, move along the
/// heading, then perturb the heading.
fn advance(state: &mut SimState, config: &SimulationConfig) {
    state.speed_mps += (state.target_speed_mps - state.speed_mps) * config.blend;

    let meters = state.speed_mps * config.tick().as_secs_f64();
    state.position.lat += meters * state.heading.cos() / METERS_PER_DEGREE;
    state.position.lon += meters * state.heading.sin()
        / (METERS_PER_DEGREE * state.position.lat.to_radians().cos());

    let jitter = config.heading_jitter_rad;
    state.heading = (state.heading + state.rng.gen_range(-jitter..=jitter)).rem_euclid(TAU);
}

/// Random-walk runner that converges on a target speed.
///
/// Fixes are produced once per tick while running. Calling [`start`](Self::start)
/// again resets the runner and ends streams from the previous run.
#[derive(Clone)]
pub struct SimulatedLocationSource {
    inner: Arc<SimInner>,
}

impl SimulatedLocationSource {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: SimulationConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = SimState {
            position: config.start,
            speed_mps: 0.0,
            target_speed_mps: 0.0,
            heading: 0.0,
            running: false,
            generation: 0,
            rng,
        };
        Self {
            inner: Arc::new(SimInner {
                state: Mutex::new(state),
                config,
                clock,
            }),
        }
    }

    /// Resets position and speed and begins a new run towards `target_speed_mps`.
    pub fn start(&self, target_speed_mps: f64) {
        let mut state = self.inner.state.lock();
        state.position = self.inner.config.start;
        state.speed_mps = 0.0;
        state.target_speed_mps = target_speed_mps.max(0.0);
        state.heading = state.rng.gen_range(0.0..TAU);
        state.running = true;
        state.generation += 1;
        info!(
            target_speed_mps = state.target_speed_mps,
            heading = state.heading,
            "Simulation started"
        );
    }

    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.running = false;
        state.speed_mps = 0.0;
        state.generation += 1;
        info!("Simulation stopped");
    }

    /// Changes the target speed of the current run without resetting it.
    pub fn set_target_speed(&self, target_speed_mps: f64) {
        self.inner.state.lock().target_speed_mps = target_speed_mps.max(0.0);
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    pub fn current_speed_mps(&self) -> f64 {
        self.inner.state.lock().speed_mps
    }

    pub fn target_speed_mps(&self) -> f64 {
        self.inner.state.lock().target_speed_mps
    }

    pub fn position(&self) -> Coordinate {
        self.inner.state.lock().position
    }

    /// Advances the current run by one tick without waiting. `None` when stopped.
    pub fn step(&self) -> Option<LocationFix> {
        let generation = self.inner.state.lock().generation;
        self.inner.tick(generation)
    }
}

#[async_trait]
impl LocationSource for SimulatedLocationSource {
    fn has_permission(&self) -> bool {
        true
    }

    async fn current_fix(&self) -> Option<LocationFix> {
        let state = self.inner.state.lock();
        Some(LocationFix::new(
            state.position,
            self.inner.clock.now_millis(),
            state.speed_mps,
        ))
    }

    fn fix_stream(&self) -> FixStream {
        let inner = self.inner.clone();
        let generation = inner.state.lock().generation;
        let period = inner.config.tick();

        stream::unfold(None, move |ticker: Option<Interval>| {
            let inner = inner.clone();
            async move {
                let mut ticker = ticker.unwrap_or_else(|| {
                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                ticker.tick().await;
                match inner.tick(generation) {
                    Some(fix) => Some((fix, Some(ticker))),
                    None => {
                        debug!(generation, "Simulated stream ended");
                        None
                    }
                }
            }
        })
        .boxed()
    }
}
