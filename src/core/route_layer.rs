//! Route line overlay lifecycle
//!
//! Owns the presence of the calculated route on the map surface:
//! idempotent show/replace, clearing, and fitting the viewport to the
//! route after rendering.

use std::sync::Arc;

use crate::core::geometry::{BoundingBox, RouteGeometry};
use crate::core::overlay::{
    remove_overlay, replace_overlay, Feature, FeatureCollection, LayerSpec, LineColor, LinePaint,
    MapSurface, ROUTE_OVERLAY,
};

/// Viewport padding around the fitted route, in pixels.
const FIT_PADDING: f64 = 50.0;
/// Viewport fit animation duration.
const FIT_DURATION_MS: u64 = 1000;

/// Presentation style for the route line.
///
/// Re-evaluated on every [`RouteOverlayManager::show`] call, so the
/// same geometry can be restyled without a geometry change.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStyle {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            color: "#0066ff".to_string(),
            width: 5.0,
            opacity: 0.8,
        }
    }
}

impl RouteStyle {
    /// High-visibility variant for emergency mode.
    pub fn emergency() -> Self {
        Self {
            color: "#ff3300".to_string(),
            ..Self::default()
        }
    }
}

/// Manages the route line overlay on a borrowed map surface.
pub struct RouteOverlayManager {
    surface: Arc<dyn MapSurface>,
}

impl RouteOverlayManager {
    pub fn new(surface: Arc<dyn MapSurface>) -> Self {
        Self { surface }
    }

    /// Render the route, replacing any previous route overlay, then
    /// fit the viewport to it.
    ///
    /// No-ops (with a warning) while the surface style is still
    /// loading; the caller re-shows once the style is ready.
    pub fn show(&self, geometry: &RouteGeometry, style: &RouteStyle) {
        if !self.surface.is_style_ready() {
            log::warn!("map style not ready, skipping route render");
            return;
        }

        let data = FeatureCollection::new(vec![Feature::line(
            geometry.coordinates.clone(),
            serde_json::json!({
                "distance": geometry.distance_m,
                "duration": geometry.duration_s,
            }),
        )]);
        let spec = LayerSpec {
            source: ROUTE_OVERLAY.source,
            paint: LinePaint {
                color: LineColor::Constant(style.color.clone()),
                width: style.width,
                opacity: style.opacity,
            },
        };

        replace_overlay(self.surface.as_ref(), ROUTE_OVERLAY, data, spec);

        // Geometry is non-empty by construction, so this cannot fail.
        if let Ok(bounds) = BoundingBox::from_points(&geometry.coordinates, 0.0) {
            self.surface
                .fit_viewport(&bounds, FIT_PADDING, FIT_DURATION_MS);
        }
    }

    /// Remove the route overlay if present. Safe to call repeatedly.
    pub fn clear(&self) {
        if !self.surface.is_style_ready() {
            return;
        }
        remove_overlay(self.surface.as_ref(), ROUTE_OVERLAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Coordinate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Surface double that tracks live sources/layers like a real map.
    struct FakeSurface {
        style_ready: AtomicBool,
        sources: Mutex<HashMap<String, FeatureCollection>>,
        layers: Mutex<HashMap<String, LayerSpec>>,
        fits: Mutex<Vec<(BoundingBox, f64, u64)>>,
    }

    impl FakeSurface {
        fn new(style_ready: bool) -> Self {
            Self {
                style_ready: AtomicBool::new(style_ready),
                sources: Mutex::new(HashMap::new()),
                layers: Mutex::new(HashMap::new()),
                fits: Mutex::new(Vec::new()),
            }
        }
    }

    impl MapSurface for FakeSurface {
        fn is_style_ready(&self) -> bool {
            self.style_ready.load(Ordering::SeqCst)
        }
        fn add_or_replace_source(&self, name: &str, data: FeatureCollection) {
            self.sources.lock().unwrap().insert(name.to_string(), data);
        }
        fn add_or_replace_layer(&self, name: &str, spec: LayerSpec) {
            self.layers.lock().unwrap().insert(name.to_string(), spec);
        }
        fn remove_layer(&self, name: &str) {
            self.layers.lock().unwrap().remove(name);
        }
        fn remove_source(&self, name: &str) {
            self.sources.lock().unwrap().remove(name);
        }
        fn fit_viewport(&self, bounds: &BoundingBox, padding: f64, duration_ms: u64) {
            self.fits.lock().unwrap().push((*bounds, padding, duration_ms));
        }
    }

    fn walk() -> RouteGeometry {
        RouteGeometry::new(
            vec![
                Coordinate::new(-74.0060, 40.7128).unwrap(),
                Coordinate::new(-74.0030, 40.7160).unwrap(),
                Coordinate::new(-74.0000, 40.7200).unwrap(),
            ],
            850.0,
            640.0,
        )
        .unwrap()
    }

    #[test]
    fn test_show_renders_single_layer() {
        let surface = Arc::new(FakeSurface::new(true));
        let manager = RouteOverlayManager::new(surface.clone());

        manager.show(&walk(), &RouteStyle::default());

        assert_eq!(surface.layers.lock().unwrap().len(), 1);
        assert_eq!(surface.sources.lock().unwrap().len(), 1);
        assert_eq!(surface.fits.lock().unwrap().len(), 1);
        let (_, padding, duration) = surface.fits.lock().unwrap()[0];
        assert_eq!(padding, 50.0);
        assert_eq!(duration, 1000);
    }

    #[test]
    fn test_show_twice_keeps_one_layer_with_second_style() {
        let surface = Arc::new(FakeSurface::new(true));
        let manager = RouteOverlayManager::new(surface.clone());
        let geometry = walk();

        manager.show(&geometry, &RouteStyle::default());
        manager.show(&geometry, &RouteStyle::emergency());

        let layers = surface.layers.lock().unwrap();
        assert_eq!(layers.len(), 1);
        let spec = layers.get(ROUTE_OVERLAY.layer).unwrap();
        assert_eq!(
            spec.paint.color,
            LineColor::Constant("#ff3300".to_string())
        );
    }

    #[test]
    fn test_show_noop_while_style_loading() {
        let surface = Arc::new(FakeSurface::new(false));
        let manager = RouteOverlayManager::new(surface.clone());

        manager.show(&walk(), &RouteStyle::default());

        assert!(surface.layers.lock().unwrap().is_empty());
        assert!(surface.sources.lock().unwrap().is_empty());
        assert!(surface.fits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let surface = Arc::new(FakeSurface::new(true));
        let manager = RouteOverlayManager::new(surface.clone());

        manager.show(&walk(), &RouteStyle::default());
        manager.clear();
        manager.clear();

        assert!(surface.layers.lock().unwrap().is_empty());
        assert!(surface.sources.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fit_bounds_cover_route() {
        let surface = Arc::new(FakeSurface::new(true));
        let manager = RouteOverlayManager::new(surface.clone());
        let geometry = walk();

        manager.show(&geometry, &RouteStyle::default());

        let (bounds, _, _) = surface.fits.lock().unwrap()[0];
        for c in &geometry.coordinates {
            assert!(bounds.southwest.lon <= c.lon && c.lon <= bounds.northeast.lon);
            assert!(bounds.southwest.lat <= c.lat && c.lat <= bounds.northeast.lat);
        }
    }
}
