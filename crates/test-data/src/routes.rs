//! Synthetic GPS fix sequences.

use geo::{Destination as _, Haversine, Point};
use journey::models::{Coordinate, LocationFix};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::profiles::RunnerProfile;

/// Shape of a generated route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoutePattern {
    /// Constant bearing in degrees (0 = north, 90 = east).
    Straight { bearing_deg: f64 },
    /// Heading drifts by up to `max_turn_deg` per step.
    RandomWalk { max_turn_deg: f64 },
}

/// Configuration for route generation.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub start: Coordinate,
    /// Timestamp of the first fix.
    pub start_ms: i64,
    /// Target distance in kilometres.
    pub distance_km: f64,
    /// Total duration. `None` derives it from the runner's speed.
    pub duration_ms: Option<u64>,
    /// Approximate distance between fixes in meters.
    pub point_spacing_m: f64,
    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,
    pub pattern: RoutePattern,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            start: journey::location::DEFAULT_LOCATION,
            start_ms: 0,
            distance_km: 1.0,
            duration_ms: None,
            point_spacing_m: 25.0,
            gps_jitter_m: 0.0,
            pattern: RoutePattern::Straight { bearing_deg: 0.0 },
        }
    }
}

/// Builds fix sequences that cover a distance in a given time.
///
/// Without jitter and with a straight pattern, the haversine path length of the
/// output equals the requested distance up to float rounding.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    config: RouteConfig,
    profile: RunnerProfile,
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self {
            config: RouteConfig::default(),
            profile: RunnerProfile::default(),
        }
    }

    pub fn start(mut self, start: Coordinate) -> Self {
        self.config.start = start;
        self
    }

    pub fn start_ms(mut self, start_ms: i64) -> Self {
        self.config.start_ms = start_ms;
        self
    }

    pub fn distance_km(mut self, km: f64) -> Self {
        self.config.distance_km = km;
        self
    }

    /// Fixes the total duration, overriding the runner's speed.
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.config.duration_ms = Some(secs * 1000);
        self
    }

    pub fn runner(mut self, profile: RunnerProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn point_spacing(mut self, meters: f64) -> Self {
        self.config.point_spacing_m = meters;
        self
    }

    pub fn gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    pub fn pattern(mut self, pattern: RoutePattern) -> Self {
        self.config.pattern = pattern;
        self
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Total duration of the route in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.config.duration_ms.unwrap_or_else(|| {
            (self.config.distance_km * 1000.0 / self.profile.speed_mps() * 1000.0).round() as u64
        })
    }

    /// Number of legs between consecutive fixes.
    fn legs(&self) -> usize {
        let meters = self.config.distance_km * 1000.0;
        if meters <= 0.0 {
            return 0;
        }
        (meters / self.config.point_spacing_m.max(1.0)).ceil() as usize
    }

    /// Generates the fix sequence. The first fix sits at the start with zero speed.
    pub fn build(&self, rng: &mut impl Rng) -> Vec<LocationFix> {
        let legs = self.legs();
        let start = self.config.start;
        if legs == 0 {
            return vec![LocationFix::new(start, self.config.start_ms, 0.0)];
        }

        let leg_m = self.config.distance_km * 1000.0 / legs as f64;
        let leg_ms = self.duration_ms() as f64 / legs as f64;
        let speed = if leg_ms > 0.0 { leg_m / (leg_ms / 1000.0) } else { 0.0 };
        let jitter = Normal::new(0.0, self.config.gps_jitter_m).ok();

        let mut bearing = match self.config.pattern {
            RoutePattern::Straight { bearing_deg } => bearing_deg,
            RoutePattern::RandomWalk { .. } => rng.gen_range(0.0..360.0),
        };
        let mut current = Point::new(start.lon, start.lat);
        let mut fixes = Vec::with_capacity(legs + 1);
        fixes.push(LocationFix::new(start, self.config.start_ms, 0.0));

        for leg in 1..=legs {
            if let RoutePattern::RandomWalk { max_turn_deg } = self.config.pattern {
                if max_turn_deg > 0.0 {
                    bearing = (bearing + rng.gen_range(-max_turn_deg..max_turn_deg)).rem_euclid(360.0);
                }
            }
            current = Haversine.destination(current, bearing, leg_m);

            let mut reported = current;
            if let Some(normal) = jitter.filter(|_| self.config.gps_jitter_m > 0.0) {
                let offset = normal.sample(rng).abs();
                reported = Haversine.destination(current, rng.gen_range(0.0..360.0), offset);
            }

            let timestamp = self.config.start_ms + (leg as f64 * leg_ms).round() as i64;
            fixes.push(LocationFix::new(
                Coordinate::new(reported.y(), reported.x()),
                timestamp,
                speed,
            ));
        }
        fixes
    }

    /// Generates only the coordinates, for replay sources.
    pub fn build_path(&self, rng: &mut impl Rng) -> Vec<Coordinate> {
        self.build(rng).iter().map(LocationFix::coordinate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journey::geo_math::path_length_km;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_straight_route_matches_distance() {
        let mut rng = StdRng::seed_from_u64(1);
        for bearing_deg in [0.0, 45.0, 90.0, 200.0] {
            let fixes = RouteBuilder::new()
                .distance_km(1.2)
                .pattern(RoutePattern::Straight { bearing_deg })
                .build(&mut rng);
            assert!((path_length_km(&fixes) - 1.2).abs() < 1e-6, "bearing {bearing_deg}");
        }
    }

    #[test]
    fn test_timestamps_span_duration() {
        let mut rng = StdRng::seed_from_u64(1);
        let fixes = RouteBuilder::new()
            .start_ms(5_000)
            .distance_km(1.0)
            .duration_secs(420)
            .build(&mut rng);

        assert_eq!(fixes.first().unwrap().timestamp_ms, 5_000);
        assert_eq!(fixes.last().unwrap().timestamp_ms, 425_000);
        assert!(fixes.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
        // 1000 m in 420 s
        assert!((fixes[1].speed_mps - 2.381).abs() < 1e-3);
    }

    #[test]
    fn test_duration_from_runner() {
        let builder = RouteBuilder::new()
            .distance_km(1.0)
            .runner(RunnerProfile::with_speed(2.5));
        assert_eq!(builder.duration_ms(), 400_000);
    }

    #[test]
    fn test_random_walk_is_reproducible() {
        let builder = RouteBuilder::new().pattern(RoutePattern::RandomWalk { max_turn_deg: 20.0 });
        let a = builder.build(&mut StdRng::seed_from_u64(7));
        let b = builder.build(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!((path_length_km(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_jitter_adds_noise() {
        let mut rng = StdRng::seed_from_u64(11);
        let fixes = RouteBuilder::new().gps_jitter(4.0).build(&mut rng);
        assert!(fixes.iter().all(|f| f.is_valid()));
        assert!(path_length_km(&fixes) > 1.0);
    }

    #[test]
    fn test_zero_distance() {
        let mut rng = StdRng::seed_from_u64(1);
        let fixes = RouteBuilder::new().distance_km(0.0).build(&mut rng);
        assert_eq!(fixes.len(), 1);
    }
}
