//! Runner pace profile.

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Pace profile for a jogger.
///
/// Based on typical walking-to-competitive running paces:
/// - Recreational: ~7:00/km (2.4 m/s)
/// - Default: ~5:00/km (3.3 m/s)
/// - Elite: ~3:30/km (4.8 m/s)
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    /// Base speed in m/s on flat terrain.
    base_speed: f64,
    /// Day-to-day variance (coefficient of variation).
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self::with_pace(5.0)
    }
}

impl RunnerProfile {
    /// Creates a profile with the given pace.
    ///
    /// # Arguments
    /// * `pace_min_per_km` - Pace in minutes per kilometer (e.g., 5.0 for 5:00/km)
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        Self {
            base_speed: 1000.0 / (pace_min_per_km * 60.0),
            variance: 0.08,
        }
    }

    /// Creates a profile running at exactly `speed_mps`.
    pub fn with_speed(speed_mps: f64) -> Self {
        Self {
            base_speed: speed_mps,
            variance: 0.08,
        }
    }

    /// Sets the day-to-day variance.
    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance.max(0.0);
        self
    }

    /// Creates an elite runner profile (~3:30/km).
    pub fn elite() -> Self {
        Self::with_pace(3.5)
    }

    /// Creates a recreational jogger profile (~7:00/km).
    pub fn recreational() -> Self {
        Self::with_pace(7.0)
    }

    /// Creates a walking profile (~12:00/km), slow enough to fail every built-in quest.
    pub fn walker() -> Self {
        Self::with_pace(12.0).with_variance(0.05)
    }

    pub fn speed_mps(&self) -> f64 {
        self.base_speed
    }

    pub fn pace_min_per_km(&self) -> f64 {
        1000.0 / (self.base_speed * 60.0)
    }

    /// Minutes needed to cover `distance_km` at the base speed.
    pub fn minutes_for(&self, distance_km: f64) -> f64 {
        distance_km * self.pace_min_per_km()
    }

    /// Samples today's speed around the base speed.
    pub fn sample_speed(&self, rng: &mut impl Rng) -> f64 {
        let factor = match Normal::new(1.0, self.variance) {
            Ok(normal) if self.variance > 0.0 => normal.sample(rng).clamp(0.7, 1.4),
            _ => 1.0,
        };
        (self.base_speed * factor).max(0.5)
    }
}
