//! CLI-specific utilities for routeviz
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality: the spinner, a map
//! surface that renders overlay activity to the terminal, and the
//! ASCII elevation profile.

pub mod progress;

pub use progress::{create_spinner, with_spinner};

use routeviz::{
    BoundingBox, CongestionBand, ElevationProfile, FeatureCollection, LayerSpec, MapSurface,
};

/// A map surface that narrates overlay activity to stderr.
///
/// Used by watch mode so the traffic overlay lifecycle can be observed
/// without a graphical map. The style is always "ready".
pub struct ConsoleSurface;

impl MapSurface for ConsoleSurface {
    fn is_style_ready(&self) -> bool {
        true
    }

    fn add_or_replace_source(&self, name: &str, data: FeatureCollection) {
        eprintln!("🗺️  source '{name}': {} feature(s)", data.features.len());
        for feature in &data.features {
            let props = &feature.properties;
            let (Some(current), Some(free), Some(level)) = (
                props["currentSpeed"].as_f64(),
                props["freeFlowSpeed"].as_f64(),
                props["congestionLevel"].as_f64(),
            ) else {
                continue;
            };
            let band = CongestionBand::classify(level);
            eprintln!(
                "    {:>5.1} / {:>5.1} km/h   congestion {:>3.0}% ({})",
                current,
                free,
                level * 100.0,
                band.label()
            );
        }
    }

    fn add_or_replace_layer(&self, name: &str, _spec: LayerSpec) {
        eprintln!("🗺️  layer '{name}' rendered");
    }

    fn remove_layer(&self, name: &str) {
        eprintln!("🗺️  layer '{name}' removed");
    }

    fn remove_source(&self, name: &str) {
        eprintln!("🗺️  source '{name}' removed");
    }

    fn fit_viewport(&self, bounds: &BoundingBox, _padding: f64, _duration_ms: u64) {
        eprintln!(
            "🗺️  viewport fit to [{:.4},{:.4}]..[{:.4},{:.4}]",
            bounds.southwest.lon, bounds.southwest.lat, bounds.northeast.lon, bounds.northeast.lat
        );
    }
}

const PROFILE_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One-line ASCII rendering of an elevation profile.
///
/// Each sample becomes a block glyph; the normalized band maps onto
/// the eight block heights.
pub fn ascii_profile(profile: &ElevationProfile) -> String {
    profile
        .points
        .iter()
        .map(|p| {
            // y runs 10 (highest) to 90 (lowest) in viewport units
            let norm = ((90.0 - p.y) / 80.0).clamp(0.0, 1.0);
            let idx = (norm * (PROFILE_BLOCKS.len() - 1) as f64).round() as usize;
            PROFILE_BLOCKS[idx]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeviz::{render_profile, Coordinate, ElevationSample};

    fn sample(elevation_m: f64) -> ElevationSample {
        ElevationSample {
            location: Coordinate::new(4.35, 50.85).unwrap(),
            elevation_m,
        }
    }

    #[test]
    fn test_ascii_profile_extremes() {
        let profile = render_profile(&[sample(0.0), sample(100.0)]).unwrap();
        let ascii = ascii_profile(&profile);
        let chars: Vec<char> = ascii.chars().collect();
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0], '▁');
        assert_eq!(chars[1], '█');
    }

    #[test]
    fn test_ascii_profile_flat_is_uniform() {
        let profile = render_profile(&[sample(5.0), sample(5.0), sample(5.0)]).unwrap();
        let ascii = ascii_profile(&profile);
        let chars: Vec<char> = ascii.chars().collect();
        assert!(chars.windows(2).all(|w| w[0] == w[1]));
    }
}
