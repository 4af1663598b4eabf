//! Route geometry primitives
//!
//! Coordinates, route geometries, down-sampling for external queries,
//! and buffered bounding boxes.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Buffer applied around a route when deriving the traffic query box,
/// in degrees (0.01 deg is roughly 1 km at mid latitudes).
pub const DEFAULT_BBOX_BUFFER_DEG: f64 = 0.01;

/// A point in WGS84 coordinates.
///
/// Serializes as a GeoJSON position `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    /// Create a coordinate, validating finiteness and WGS84 ranges.
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(Error::InvalidInput(format!(
                "coordinate ({lon}, {lat}) is not finite"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidInput(format!(
                "longitude {lon} outside valid range [-180, 180]"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidInput(format!(
                "latitude {lat} outside valid range [-90, 90]"
            )));
        }
        Ok(Self { lon, lat })
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = Error;

    fn try_from(pos: [f64; 2]) -> Result<Self> {
        Coordinate::new(pos[0], pos[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

/// Parse a single "lon,lat" pair.
pub fn parse_lon_lat(input: &str) -> Result<Coordinate> {
    let parts: Vec<&str> = input.split(',').collect();
    if parts.len() != 2 {
        return Err(Error::InvalidInput(format!(
            "'{input}' must have exactly 2 values (lon,lat) separated by comma"
        )));
    }
    let lon: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid longitude: '{}'", parts[0])))?;
    let lat: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid latitude: '{}'", parts[1])))?;
    Coordinate::new(lon, lat)
}

/// Route geometry with coordinates and provider summary figures.
///
/// Produced once per successful route calculation and replaced
/// wholesale on the next one.
#[derive(Debug, Clone, Serialize)]
pub struct RouteGeometry {
    pub coordinates: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

impl RouteGeometry {
    /// Build a route geometry from an ordered coordinate sequence.
    ///
    /// A path needs at least two points.
    pub fn new(coordinates: Vec<Coordinate>, distance_m: f64, duration_s: f64) -> Result<Self> {
        if coordinates.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "a route needs at least 2 coordinates, got {}",
                coordinates.len()
            )));
        }
        Ok(Self {
            coordinates,
            distance_m,
            duration_s,
        })
    }

    /// Buffered bounding box around the route, for area queries.
    pub fn bounding_box(&self, buffer: f64) -> Result<BoundingBox> {
        BoundingBox::from_points(&self.coordinates, buffer)
    }
}

/// Axis-aligned bounding box: southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub southwest: Coordinate,
    pub northeast: Coordinate,
}

impl BoundingBox {
    /// Componentwise min/max over all points, expanded by `buffer`
    /// degrees on both axes.
    ///
    /// With `buffer == 0` and a single input point the box degenerates
    /// to a point; callers must tolerate a zero-area box.
    pub fn from_points(points: &[Coordinate], buffer: f64) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyGeometry(
                "cannot build a bounding box from no points".to_string(),
            ));
        }

        let mut min_lon = f64::INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut max_lat = f64::NEG_INFINITY;

        for p in points {
            min_lon = min_lon.min(p.lon);
            min_lat = min_lat.min(p.lat);
            max_lon = max_lon.max(p.lon);
            max_lat = max_lat.max(p.lat);
        }

        Ok(Self {
            southwest: Coordinate {
                lon: min_lon - buffer,
                lat: min_lat - buffer,
            },
            northeast: Coordinate {
                lon: max_lon + buffer,
                lat: max_lat + buffer,
            },
        })
    }
}

/// Reduce a dense coordinate sequence to a bounded-size sample.
///
/// Sequences no longer than `max_points` are returned unchanged.
/// Otherwise points are taken at a fixed stride of
/// `ceil(len / max_points)`, and the final point is appended if the
/// stride missed it. The output therefore never exceeds
/// `max_points + 1` points and always contains the last input point.
pub fn sample_points(points: &[Coordinate], max_points: usize) -> Vec<Coordinate> {
    assert!(max_points > 0, "max_points must be positive");

    if points.len() <= max_points {
        return points.to_vec();
    }

    let stride = points.len().div_ceil(max_points);
    let mut sampled: Vec<Coordinate> = points.iter().step_by(stride).copied().collect();

    let last = points[points.len() - 1];
    if sampled.last() != Some(&last) {
        sampled.push(last);
    }

    sampled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(-74.0060, 40.7128).is_ok());
        assert!(Coordinate::new(181.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -91.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_coordinate_geojson_position() {
        let c = coord(4.3517, 50.8503);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "[4.3517,50.8503]");

        let back: Coordinate = serde_json::from_str("[4.3517,50.8503]").unwrap();
        assert_eq!(back, c);

        // Out-of-range positions are rejected on deserialization
        let bad: std::result::Result<Coordinate, _> = serde_json::from_str("[200.0,10.0]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_lon_lat() {
        let c = parse_lon_lat("-74.0060,40.7128").unwrap();
        assert!((c.lon - (-74.0060)).abs() < 1e-9);
        assert!((c.lat - 40.7128).abs() < 1e-9);

        assert!(parse_lon_lat("abc,50.0").is_err());
        assert!(parse_lon_lat("4.0").is_err());
        assert!(parse_lon_lat("4.0,91.0").is_err());
    }

    #[test]
    fn test_route_geometry_needs_two_points() {
        assert!(RouteGeometry::new(vec![coord(0.0, 0.0)], 0.0, 0.0).is_err());
        assert!(RouteGeometry::new(vec![coord(0.0, 0.0), coord(1.0, 1.0)], 120.0, 90.0).is_ok());
    }

    #[test]
    fn test_sample_short_input_unchanged() {
        let pts: Vec<Coordinate> = (0..10).map(|i| coord(i as f64 * 0.001, 0.0)).collect();
        let sampled = sample_points(&pts, 20);
        assert_eq!(sampled, pts);
    }

    #[test]
    fn test_sample_includes_last_point() {
        // 25 raw coordinates along a short walk, sampled to at most 20
        let pts: Vec<Coordinate> = (0..25)
            .map(|i| {
                let t = i as f64 / 24.0;
                coord(-74.0060 + t * 0.0060, 40.7128 + t * 0.0072)
            })
            .collect();

        let sampled = sample_points(&pts, 20);
        assert!(sampled.len() <= 21);
        assert_eq!(*sampled.last().unwrap(), pts[24]);
        assert_eq!(sampled[0], pts[0]);
    }

    #[test]
    fn test_sample_bound_holds_for_many_sizes() {
        for n in 1..200usize {
            let pts: Vec<Coordinate> = (0..n).map(|i| coord(i as f64 * 0.0001, 0.0)).collect();
            for max in [1usize, 2, 5, 20] {
                let sampled = sample_points(&pts, max);
                assert!(
                    sampled.len() <= max + 1,
                    "n={n} max={max} got {}",
                    sampled.len()
                );
                assert_eq!(*sampled.last().unwrap(), pts[n - 1]);
            }
        }
    }

    #[test]
    fn test_sample_deterministic() {
        let pts: Vec<Coordinate> = (0..57).map(|i| coord(i as f64 * 0.001, 0.0)).collect();
        assert_eq!(sample_points(&pts, 20), sample_points(&pts, 20));
    }

    #[test]
    fn test_bounding_box_contains_all_points() {
        let pts = [
            coord(4.35, 50.85),
            coord(4.40, 50.86),
            coord(4.32, 50.90),
        ];
        let bb = BoundingBox::from_points(&pts, 0.01).unwrap();

        for p in &pts {
            assert!(bb.southwest.lon < p.lon);
            assert!(bb.northeast.lon > p.lon);
            assert!(bb.southwest.lat < p.lat);
            assert!(bb.northeast.lat > p.lat);
        }
        assert!((bb.southwest.lon - (4.32 - 0.01)).abs() < 1e-12);
        assert!((bb.northeast.lat - (50.90 + 0.01)).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_zero_buffer_equality() {
        let pts = [coord(4.35, 50.85), coord(4.40, 50.86)];
        let bb = BoundingBox::from_points(&pts, 0.0).unwrap();
        assert_eq!(bb.southwest.lon, 4.35);
        assert_eq!(bb.northeast.lon, 4.40);
        assert_eq!(bb.southwest.lat, 50.85);
        assert_eq!(bb.northeast.lat, 50.86);
    }

    #[test]
    fn test_bounding_box_single_point() {
        let pts = [coord(4.35, 50.85)];

        // Positive buffer guarantees positive area
        let bb = BoundingBox::from_points(&pts, 0.01).unwrap();
        assert!(bb.northeast.lon > bb.southwest.lon);
        assert!(bb.northeast.lat > bb.southwest.lat);

        // Zero buffer degenerates to a point; callers must tolerate it
        let degenerate = BoundingBox::from_points(&pts, 0.0).unwrap();
        assert_eq!(degenerate.southwest, degenerate.northeast);
    }

    #[test]
    fn test_bounding_box_empty_input() {
        let err = BoundingBox::from_points(&[], 0.01).unwrap_err();
        assert!(matches!(err, Error::EmptyGeometry(_)));
    }
}
