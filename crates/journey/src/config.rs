//! Tracker and location source configuration.
//!
//! Durations are stored as milliseconds so the JSON form stays flat. Every
//! section falls back to its defaults when missing from the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::location::DEFAULT_LOCATION;
use crate::models::Coordinate;

/// Top-level configuration for a tracker and its location sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Granularity of the elapsed-time ticker.
    pub elapsed_tick_ms: u64,
    pub feedback: FeedbackConfig,
    pub live: LiveSourceConfig,
    pub simulation: SimulationConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            elapsed_tick_ms: 100,
            feedback: FeedbackConfig::default(),
            live: LiveSourceConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Loads a JSON config file and validates it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn elapsed_tick(&self) -> Duration {
        Duration::from_millis(self.elapsed_tick_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.elapsed_tick_ms == 0 {
            return Err(ConfigError::Invalid("elapsed_tick_ms must be positive".into()));
        }
        self.feedback.validate()?;
        self.live.validate()?;
        self.simulation.validate()
    }
}

/// Cadence and thresholds of the pace feedback checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// How often the checker wakes up.
    pub poll_interval_ms: u64,
    /// Minimum spacing between two evaluations, also the delay before the first.
    pub min_gap_ms: u64,
    /// Average speed below `required * warning_ratio` triggers a warning.
    pub warning_ratio: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            min_gap_ms: 10_000,
            warning_ratio: 0.8,
        }
    }
}

impl FeedbackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("feedback.poll_interval_ms must be positive".into()));
        }
        if !(self.warning_ratio > 0.0 && self.warning_ratio <= 1.0) {
            return Err(ConfigError::Invalid("feedback.warning_ratio must be in (0, 1]".into()));
        }
        Ok(())
    }
}

/// Timing of the live positioning source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSourceConfig {
    /// A last-known fix older than this is not reused.
    pub staleness_ms: u64,
    /// Upper bound on waiting for a fresh fix.
    pub fresh_fix_timeout_ms: u64,
    /// Nominal interval of the continuous fix stream.
    pub stream_interval_ms: u64,
}

impl Default for LiveSourceConfig {
    fn default() -> Self {
        Self {
            staleness_ms: 5 * 60 * 1_000,
            fresh_fix_timeout_ms: 15_000,
            stream_interval_ms: 10_000,
        }
    }
}

impl LiveSourceConfig {
    pub fn fresh_fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fresh_fix_timeout_ms)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fresh_fix_timeout_ms == 0 || self.stream_interval_ms == 0 {
            return Err(ConfigError::Invalid("live source intervals must be positive".into()));
        }
        Ok(())
    }
}

/// Parameters of the synthetic runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_ms: u64,
    /// Fraction of the gap to the target speed closed on every tick.
    pub blend: f64,
    /// Maximum heading change per tick, in radians.
    pub heading_jitter_rad: f64,
    pub start: Coordinate,
    /// Seed for reproducible paths. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            blend: 0.1,
            heading_jitter_rad: 0.05,
            start: DEFAULT_LOCATION,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("simulation.tick_ms must be positive".into()));
        }
        if !(self.blend > 0.0 && self.blend <= 1.0) {
            return Err(ConfigError::Invalid("simulation.blend must be in (0, 1]".into()));
        }
        if !self.start.is_valid() {
            return Err(ConfigError::Invalid("simulation.start is not a valid coordinate".into()));
        }
        Ok(())
    }
}
