//! Great-circle distance between coordinates.

use geo::{Distance as _, Haversine, Point};

use crate::models::{Coordinate, LocationFix};

/// Haversine distance between two coordinates in kilometres.
///
/// Identical points yield exactly 0. NaN input propagates to the output.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat)) / 1000.0
}

/// Sum of the distances between consecutive fixes, in kilometres.
pub fn path_length_km(fixes: &[LocationFix]) -> f64 {
    fixes
        .windows(2)
        .map(|pair| distance_km(pair[0].coordinate(), pair[1].coordinate()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUMMERSBACH: Coordinate = Coordinate::new(51.0269, 7.5636);

    #[test]
    fn test_identical_points() {
        assert_eq!(distance_km(GUMMERSBACH, GUMMERSBACH), 0.0);
        let origin = Coordinate::new(0.0, 0.0);
        assert_eq!(distance_km(origin, origin), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let other = Coordinate::new(51.0300, 7.5680);
        let ab = distance_km(GUMMERSBACH, other);
        let ba = distance_km(other, GUMMERSBACH);
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        // ~111km per degree of latitude
        let dist = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((dist - 111.2).abs() < 0.5);
    }

    #[test]
    fn test_antipodal() {
        let dist = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        // Half the circumference of the mean-radius sphere
        assert!((dist - 20_015.1).abs() < 1.0);
    }

    #[test]
    fn test_nan_passthrough() {
        assert!(distance_km(Coordinate::new(f64::NAN, 0.0), GUMMERSBACH).is_nan());
    }

    #[test]
    fn test_path_length() {
        let fixes: Vec<LocationFix> = [(0.0, 0.0), (0.001, 0.0), (0.002, 0.0)]
            .iter()
            .map(|&(lat, lon)| LocationFix::new(Coordinate::new(lat, lon), 0, 0.0))
            .collect();
        let expected = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.002, 0.0));
        assert!((path_length_km(&fixes) - expected).abs() < 1e-9);
        assert_eq!(path_length_km(&fixes[..1]), 0.0);
        assert_eq!(path_length_km(&[]), 0.0);
    }
}
