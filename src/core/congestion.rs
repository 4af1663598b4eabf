//! Congestion scoring for traffic flow segments
//!
//! Converts raw speed measurements into a normalized congestion level,
//! a categorical band for presentation, and a color for rendering.

use serde::Serialize;

use crate::core::geometry::Coordinate;

/// One traffic-provider measurement along a road geometry.
///
/// Speeds are km/h, travel times seconds, confidence in [0,1].
#[derive(Debug, Clone, Serialize)]
pub struct FlowSegment {
    pub geometry: Vec<Coordinate>,
    pub current_speed: f64,
    pub free_flow_speed: f64,
    pub current_travel_time: f64,
    pub free_flow_travel_time: f64,
    pub confidence: f64,
}

/// Normalized congestion level in [0, 1].
///
/// 0 means traffic flows at free-flow speed, 1 means standstill.
/// A missing free-flow reference (zero or negative) is treated as
/// "no congestion signal", not as an error.
pub fn congestion_level(segment: &FlowSegment) -> f64 {
    if segment.free_flow_speed <= 0.0 {
        return 0.0;
    }
    (1.0 - segment.current_speed / segment.free_flow_speed).clamp(0.0, 1.0)
}

/// Categorical congestion band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CongestionBand {
    Low,
    Moderate,
    High,
}

impl CongestionBand {
    /// Classify a congestion level. Bands are inclusive on their lower
    /// edge: [0, 30)% Low, [30, 60)% Moderate, [60, 100]% High.
    pub fn classify(level: f64) -> Self {
        let pct = level * 100.0;
        if pct < 30.0 {
            CongestionBand::Low
        } else if pct < 60.0 {
            CongestionBand::Moderate
        } else {
            CongestionBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CongestionBand::Low => "Low",
            CongestionBand::Moderate => "Moderate",
            CongestionBand::High => "High",
        }
    }
}

/// Color ramp stops for the congestion level, as (level, hex color).
///
/// These also feed the traffic layer's paint spec so the map surface
/// interpolates with the same ramp.
pub const CONGESTION_COLOR_STOPS: &[(f64, &str)] = &[
    (0.0, "#4CAF50"), // free flow (green)
    (0.3, "#FFEB3B"), // light congestion (yellow)
    (0.6, "#FF9800"), // moderate congestion (orange)
    (1.0, "#F44336"), // heavy congestion (red)
];

/// Linear interpolation over the 4-stop ramp.
///
/// Pure function of the level, independent of [`CongestionBand`].
pub fn congestion_color(level: f64) -> String {
    let level = level.clamp(0.0, 1.0);

    let mut lower = CONGESTION_COLOR_STOPS[0];
    let mut upper = CONGESTION_COLOR_STOPS[CONGESTION_COLOR_STOPS.len() - 1];
    for window in CONGESTION_COLOR_STOPS.windows(2) {
        if level >= window[0].0 && level <= window[1].0 {
            lower = window[0];
            upper = window[1];
            break;
        }
    }

    if upper.0 == lower.0 {
        return lower.1.to_string();
    }

    let t = (level - lower.0) / (upper.0 - lower.0);
    let (r0, g0, b0) = parse_hex(lower.1);
    let (r1, g1, b1) = parse_hex(upper.1);

    let lerp = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };

    format!("#{:02X}{:02X}{:02X}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

fn parse_hex(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    (
        u8::from_str_radix(&hex[0..2], 16).unwrap_or(0),
        u8::from_str_radix(&hex[2..4], 16).unwrap_or(0),
        u8::from_str_radix(&hex[4..6], 16).unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(current_speed: f64, free_flow_speed: f64) -> FlowSegment {
        FlowSegment {
            geometry: vec![
                Coordinate::new(4.35, 50.85).unwrap(),
                Coordinate::new(4.36, 50.86).unwrap(),
            ],
            current_speed,
            free_flow_speed,
            current_travel_time: 120.0,
            free_flow_travel_time: 90.0,
            confidence: 0.95,
        }
    }

    #[test]
    fn test_level_bounded() {
        for (cur, free) in [
            (0.0, 50.0),
            (50.0, 50.0),
            (80.0, 50.0), // faster than free flow
            (20.0, 50.0),
            (1.0, 1000.0),
        ] {
            let level = congestion_level(&segment(cur, free));
            assert!((0.0..=1.0).contains(&level), "{cur}/{free} -> {level}");
        }
    }

    #[test]
    fn test_level_zero_free_flow_guard() {
        assert_eq!(congestion_level(&segment(0.0, 0.0)), 0.0);
        assert_eq!(congestion_level(&segment(30.0, 0.0)), 0.0);
        assert_eq!(congestion_level(&segment(30.0, -5.0)), 0.0);
    }

    #[test]
    fn test_level_faster_than_free_flow_clamps_to_zero() {
        assert_eq!(congestion_level(&segment(80.0, 50.0)), 0.0);
    }

    #[test]
    fn test_scenario_heavy_congestion_boundary() {
        // current 20 km/h against free flow 50 km/h: level 0.6, and
        // the 60% boundary belongs to the High band.
        let level = congestion_level(&segment(20.0, 50.0));
        assert!((level - 0.6).abs() < 1e-12);
        assert_eq!(CongestionBand::classify(level), CongestionBand::High);
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(CongestionBand::classify(0.0), CongestionBand::Low);
        assert_eq!(CongestionBand::classify(0.29), CongestionBand::Low);
        assert_eq!(CongestionBand::classify(0.3), CongestionBand::Moderate);
        assert_eq!(CongestionBand::classify(0.59), CongestionBand::Moderate);
        assert_eq!(CongestionBand::classify(0.6), CongestionBand::High);
        assert_eq!(CongestionBand::classify(1.0), CongestionBand::High);
    }

    #[test]
    fn test_color_at_stops() {
        assert_eq!(congestion_color(0.0), "#4CAF50");
        assert_eq!(congestion_color(0.3), "#FFEB3B");
        assert_eq!(congestion_color(0.6), "#FF9800");
        assert_eq!(congestion_color(1.0), "#F44336");
    }

    #[test]
    fn test_color_interpolates_between_stops() {
        // Halfway between green (#4CAF50) and yellow (#FFEB3B)
        let mid = congestion_color(0.15);
        assert_eq!(mid, "#A6CD46");
    }

    #[test]
    fn test_color_clamps_out_of_range() {
        assert_eq!(congestion_color(-0.5), "#4CAF50");
        assert_eq!(congestion_color(1.5), "#F44336");
    }
}
