//! Playback of a recorded or predefined route.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use time::OffsetDateTime;
use tokio::time::{Interval, MissedTickBehavior};

use super::{FixStream, LocationSource};
use crate::clock::{Clock, MonotonicClock};
use crate::errors::RouteError;
use crate::geo_math::distance_km;
use crate::models::{Coordinate, LocationFix};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReplayPoint {
    coordinate: Coordinate,
    speed_mps: f64,
}

/// Emits the points of a route one per interval, then ends.
///
/// Timestamps come from the clock at emission time, so a recorded track
/// replays "now" rather than at its original time.
#[derive(Clone)]
pub struct ReplayLocationSource {
    points: Arc<[ReplayPoint]>,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl ReplayLocationSource {
    /// Replays plain coordinates, all reported at `speed_mps`.
    pub fn from_coordinates(
        route: &[Coordinate],
        interval: Duration,
        speed_mps: f64,
    ) -> Result<Self, RouteError> {
        let points: Vec<ReplayPoint> = route
            .iter()
            .map(|&coordinate| ReplayPoint {
                coordinate,
                speed_mps,
            })
            .collect();
        Self::from_points(points, interval)
    }

    /// Loads a GPX file and replays all of its track points.
    pub fn from_gpx_file(
        path: impl AsRef<Path>,
        interval: Duration,
        default_speed_mps: f64,
    ) -> Result<Self, RouteError> {
        let file = std::fs::File::open(path)?;
        Self::from_gpx_reader(std::io::BufReader::new(file), interval, default_speed_mps)
    }

    /// Parses GPX from any reader.
    ///
    /// The reported speed of each point is its recorded speed when present,
    /// else the speed derived from the previous point's timestamp, else
    /// `default_speed_mps`.
    pub fn from_gpx_reader(
        reader: impl Read,
        interval: Duration,
        default_speed_mps: f64,
    ) -> Result<Self, RouteError> {
        let gpx = gpx::read(reader)?;

        let mut points = Vec::new();
        let mut previous: Option<(Coordinate, Option<OffsetDateTime>)> = None;

        for track in &gpx.tracks {
            for segment in &track.segments {
                for waypoint in &segment.points {
                    let point = waypoint.point();
                    let coordinate = Coordinate::new(point.y(), point.x());
                    let timestamp = waypoint.time.map(OffsetDateTime::from);

                    let derived = match (previous, timestamp) {
                        (Some((prev, Some(prev_time))), Some(time)) => {
                            let seconds = (time - prev_time).as_seconds_f64();
                            (seconds > 0.0)
                                .then(|| distance_km(prev, coordinate) * 1000.0 / seconds)
                        }
                        _ => None,
                    };
                    let speed_mps = waypoint.speed.or(derived).unwrap_or(default_speed_mps);

                    points.push(ReplayPoint {
                        coordinate,
                        speed_mps,
                    });
                    previous = Some((coordinate, timestamp));
                }
            }
        }

        Self::from_points(points, interval)
    }

    fn from_points(points: Vec<ReplayPoint>, interval: Duration) -> Result<Self, RouteError> {
        if points.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self {
            points: points.into(),
            interval,
            clock: Arc::new(MonotonicClock::new()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[async_trait]
impl LocationSource for ReplayLocationSource {
    fn has_permission(&self) -> bool {
        true
    }

    /// The start of the route.
    async fn current_fix(&self) -> Option<LocationFix> {
        self.points
            .first()
            .map(|p| LocationFix::new(p.coordinate, self.clock.now_millis(), p.speed_mps))
    }

    fn fix_stream(&self) -> FixStream {
        let points = self.points.clone();
        let clock = self.clock.clone();
        let period = self.interval;

        stream::unfold((0usize, None), move |(index, ticker): (usize, Option<Interval>)| {
            let points = points.clone();
            let clock = clock.clone();
            async move {
                let point = points.get(index)?;
                let mut ticker = ticker.unwrap_or_else(|| {
                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                ticker.tick().await;
                let fix = LocationFix::new(point.coordinate, clock.now_millis(), point.speed_mps);
                Some((fix, (index + 1, Some(ticker))))
            }
        })
        .boxed()
    }
}

/// Short built-in routes around Gummersbach, keyed by quest id.
pub fn test_route(name: &str) -> Option<Vec<Coordinate>> {
    let raw: &[(f64, f64)] = match name {
        "easy_jogger1" => &[
            (51.0269, 7.5636),
            (51.0270, 7.5638),
            (51.0271, 7.5640),
            (51.0272, 7.5642),
        ],
        "medium_runner" => &[
            (51.0269, 7.5636),
            (51.0275, 7.5640),
            (51.0280, 7.5645),
            (51.0285, 7.5650),
        ],
        "hard_marathon" => &[
            (51.0269, 7.5636),
            (51.0280, 7.5650),
            (51.0290, 7.5665),
            (51.0300, 7.5680),
        ],
        _ => return None,
    };
    Some(raw.iter().map(|&(lat, lon)| Coordinate::new(lat, lon)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="journey-tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="51.0269000" lon="7.5636000"><time>2024-05-01T08:00:00Z</time></trkpt>
      <trkpt lat="51.0270000" lon="7.5636000"><time>2024-05-01T08:00:05Z</time></trkpt>
      <trkpt lat="51.0271000" lon="7.5636000"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_test_routes() {
        assert_eq!(test_route("easy_jogger1").unwrap().len(), 4);
        assert!(test_route("hard_marathon").is_some());
        assert!(test_route("unknown").is_none());
    }

    #[test]
    fn test_empty_route_rejected() {
        let result = ReplayLocationSource::from_coordinates(&[], Duration::from_secs(1), 2.0);
        assert!(matches!(result, Err(RouteError::Empty)));
    }

    #[test]
    fn test_gpx_speeds() {
        let source =
            ReplayLocationSource::from_gpx_reader(GPX.as_bytes(), Duration::from_secs(1), 2.0)
                .unwrap();
        assert_eq!(source.len(), 3);

        // First point has no predecessor, third has no timestamp
        assert_eq!(source.points[0].speed_mps, 2.0);
        assert_eq!(source.points[2].speed_mps, 2.0);

        // ~11.1 m in 5 s
        assert!((source.points[1].speed_mps - 2.22).abs() < 0.05);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_replays_then_ends() {
        let route = test_route("medium_runner").unwrap();
        let source = ReplayLocationSource::from_coordinates(&route, Duration::from_secs(2), 3.0)
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(5)));

        let fixes: Vec<LocationFix> = source.fix_stream().collect().await;
        assert_eq!(fixes.len(), 4);
        assert_eq!(fixes[3].coordinate(), route[3]);
        assert!(fixes.iter().all(|f| f.speed_mps == 3.0 && f.timestamp_ms == 5));
    }
}
