//! Switching between live positioning and the simulator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use super::{DEFAULT_LOCATION, LocationSource, SimulatedLocationSource};
use crate::models::Coordinate;

/// Hands out either the live source or the simulator, depending on mode.
///
/// The tracker never sees the difference; callers ask [`active`](Self::active)
/// for a source and subscribe to its stream.
pub struct LocationService {
    live: Arc<dyn LocationSource>,
    simulator: SimulatedLocationSource,
    simulating: AtomicBool,
}

impl LocationService {
    pub fn new(live: Arc<dyn LocationSource>, simulator: SimulatedLocationSource) -> Self {
        Self {
            live,
            simulator,
            simulating: AtomicBool::new(false),
        }
    }

    pub fn enable_simulation(&self) {
        self.simulating.store(true, Ordering::SeqCst);
        info!("Simulation mode enabled");
    }

    /// Leaves simulation mode and stops the simulator.
    pub fn disable_simulation(&self) {
        self.simulating.store(false, Ordering::SeqCst);
        self.simulator.stop();
        info!("Simulation mode disabled");
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating.load(Ordering::SeqCst)
    }

    /// Starts the simulator. Ignored outside simulation mode.
    pub fn start_simulation(&self, target_speed_mps: f64) -> bool {
        if !self.is_simulating() {
            return false;
        }
        self.simulator.start(target_speed_mps);
        true
    }

    pub fn simulator(&self) -> &SimulatedLocationSource {
        &self.simulator
    }

    pub fn active(&self) -> Arc<dyn LocationSource> {
        if self.is_simulating() {
            Arc::new(self.simulator.clone())
        } else {
            self.live.clone()
        }
    }

    /// Current position of the active source, or [`DEFAULT_LOCATION`].
    pub async fn position_or_default(&self) -> Coordinate {
        self.active()
            .current_fix()
            .await
            .map(|fix| fix.coordinate())
            .unwrap_or(DEFAULT_LOCATION)
    }
}
