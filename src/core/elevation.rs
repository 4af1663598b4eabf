//! Elevation profile rendering
//!
//! Turns a sequence of elevation samples along a route into a
//! normalized polyline and summary statistics. The horizontal axis is
//! the sample index, not geographic distance: samples come back evenly
//! strided along the route, and a uniform axis keeps profiles of any
//! length comparable.

use serde::Serialize;

use crate::core::error::{Error, Result};
use crate::core::geometry::Coordinate;

/// Height of the virtual viewport the profile is normalized into.
const VIEWPORT_HEIGHT: f64 = 100.0;
/// The profile occupies the 10-90% band of the viewport.
const BAND_SCALE: f64 = 80.0;
const BAND_OFFSET: f64 = 10.0;

/// Elevation at a point along the route.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ElevationSample {
    pub location: Coordinate,
    /// Elevation in meters above sea level
    pub elevation_m: f64,
}

/// Summary statistics over a profile's samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationStats {
    pub min_m: f64,
    pub max_m: f64,
    pub range_m: f64,
}

/// A vertex of the normalized profile polyline.
///
/// `x` is the sample index; `y` is in viewport units with 0 at the top,
/// matching screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub x: f64,
    pub y: f64,
}

/// A rendered elevation profile: normalized polyline plus stats.
#[derive(Debug, Clone, Serialize)]
pub struct ElevationProfile {
    pub points: Vec<ProfilePoint>,
    pub stats: ElevationStats,
}

/// Render a profile from elevation samples in route order.
///
/// Fails with [`Error::InsufficientData`] when `samples` is empty; the
/// caller is expected to show a "no data" placeholder in that case.
/// A flat profile (range 0, including the single-sample case) renders
/// on the viewport mid-line instead of dividing by zero.
pub fn render_profile(samples: &[ElevationSample]) -> Result<ElevationProfile> {
    if samples.is_empty() {
        return Err(Error::InsufficientData(
            "no elevation samples to render".to_string(),
        ));
    }

    let mut min_m = f64::INFINITY;
    let mut max_m = f64::NEG_INFINITY;
    for s in samples {
        min_m = min_m.min(s.elevation_m);
        max_m = max_m.max(s.elevation_m);
    }
    let range_m = max_m - min_m;

    let points = samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let norm = if range_m > 0.0 {
                (s.elevation_m - min_m) / range_m
            } else {
                0.5
            };
            ProfilePoint {
                x: i as f64,
                y: VIEWPORT_HEIGHT - (norm * BAND_SCALE + BAND_OFFSET),
            }
        })
        .collect();

    Ok(ElevationProfile {
        points,
        stats: ElevationStats {
            min_m,
            max_m,
            range_m,
        },
    })
}

impl ElevationProfile {
    /// SVG path data for the profile: the polyline from first to last
    /// sample, closed down to the baseline so it can be filled.
    pub fn to_svg_path(&self) -> String {
        let mut d = format!("M 0,{:.2}", self.points[0].y);
        for p in &self.points[1..] {
            d.push_str(&format!(" L {},{:.2}", p.x, p.y));
        }
        let last_x = self.points[self.points.len() - 1].x;
        d.push_str(&format!(" L {},{VIEWPORT_HEIGHT} L 0,{VIEWPORT_HEIGHT} Z", last_x));
        d
    }

    /// A complete standalone SVG document for the profile.
    pub fn to_svg_document(&self) -> String {
        format!(
            concat!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100%\" height=\"150\" ",
                "viewBox=\"0 0 {} {}\" preserveAspectRatio=\"none\">",
                "<path d=\"{}\" fill=\"rgba(66, 135, 245, 0.5)\" ",
                "stroke=\"#2a67c9\" stroke-width=\"1\"/></svg>"
            ),
            self.points.len(),
            VIEWPORT_HEIGHT,
            self.to_svg_path()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elevation_m: f64) -> ElevationSample {
        ElevationSample {
            location: Coordinate::new(4.35, 50.85).unwrap(),
            elevation_m,
        }
    }

    #[test]
    fn test_render_empty_is_insufficient_data() {
        let err = render_profile(&[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_render_single_sample_no_division_by_zero() {
        let profile = render_profile(&[sample(120.0)]).unwrap();
        assert_eq!(profile.stats.range_m, 0.0);
        assert_eq!(profile.stats.min_m, 120.0);
        assert_eq!(profile.stats.max_m, 120.0);
        // Mid-line: norm 0.5 -> y = 100 - (0.5*80 + 10) = 50
        assert_eq!(profile.points.len(), 1);
        assert!((profile.points[0].y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_flat_profile_sits_on_midline() {
        let samples = vec![sample(7.0), sample(7.0), sample(7.0)];
        let profile = render_profile(&samples).unwrap();
        assert_eq!(profile.stats.range_m, 0.0);
        for p in &profile.points {
            assert!((p.y - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_render_normalization_band() {
        let samples = vec![sample(100.0), sample(150.0), sample(200.0)];
        let profile = render_profile(&samples).unwrap();

        assert_eq!(
            profile.stats,
            ElevationStats {
                min_m: 100.0,
                max_m: 200.0,
                range_m: 100.0,
            }
        );

        // Minimum lands at the bottom of the band (y = 90), maximum at
        // the top (y = 10), midpoint in between.
        assert!((profile.points[0].y - 90.0).abs() < 1e-9);
        assert!((profile.points[1].y - 50.0).abs() < 1e-9);
        assert!((profile.points[2].y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_band_independent_of_magnitude() {
        // A mountain route and a beach route normalize to the same band
        let alpine = render_profile(&[sample(1200.0), sample(2800.0)]).unwrap();
        let coastal = render_profile(&[sample(1.0), sample(9.0)]).unwrap();

        assert!((alpine.points[0].y - coastal.points[0].y).abs() < 1e-9);
        assert!((alpine.points[1].y - coastal.points[1].y).abs() < 1e-9);
    }

    #[test]
    fn test_render_index_spacing() {
        let samples: Vec<ElevationSample> = (0..5).map(|i| sample(i as f64 * 10.0)).collect();
        let profile = render_profile(&samples).unwrap();
        for (i, p) in profile.points.iter().enumerate() {
            assert_eq!(p.x, i as f64);
        }
    }

    #[test]
    fn test_svg_path_shape() {
        let samples = vec![sample(0.0), sample(10.0), sample(5.0)];
        let profile = render_profile(&samples).unwrap();
        let d = profile.to_svg_path();

        assert!(d.starts_with("M 0,"));
        // Closed down to the baseline at the last index
        assert!(d.ends_with("L 2,100 L 0,100 Z"));

        let doc = profile.to_svg_document();
        assert!(doc.contains("viewBox=\"0 0 3 100\""));
    }
}
