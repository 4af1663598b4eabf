//! Map surface interface and overlay primitives
//!
//! The map surface (pan/zoom, style loading, event handling) lives
//! outside this crate; overlay managers talk to it through the
//! [`MapSurface`] trait. An overlay is a named (source, layer) pair
//! that is always replaced as a unit, never duplicated.

use serde::Serialize;

use crate::core::geometry::{BoundingBox, Coordinate};

/// Names of the (source, layer) pair backing one logical overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandle {
    pub source: &'static str,
    pub layer: &'static str,
}

/// The route line overlay.
pub const ROUTE_OVERLAY: OverlayHandle = OverlayHandle {
    source: "route",
    layer: "route",
};

/// The traffic congestion overlay.
pub const TRAFFIC_OVERLAY: OverlayHandle = OverlayHandle {
    source: "traffic-data",
    layer: "traffic-flow",
};

/// GeoJSON geometry. Only line strings are rendered by this crate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Coordinate> },
}

/// A GeoJSON feature with arbitrary properties.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub properties: serde_json::Value,
    pub geometry: Geometry,
}

impl Feature {
    pub fn line(coordinates: Vec<Coordinate>, properties: serde_json::Value) -> Self {
        Self {
            feature_type: "Feature",
            properties,
            geometry: Geometry::LineString { coordinates },
        }
    }
}

/// A GeoJSON feature collection, the payload of an overlay source.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            collection_type: "FeatureCollection",
            features,
        }
    }
}

/// Line color: a constant, or interpolated from a feature property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LineColor {
    Constant(String),
    Interpolate {
        property: String,
        stops: Vec<(f64, String)>,
    },
}

/// Paint settings for a line layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePaint {
    pub color: LineColor,
    pub width: f64,
    pub opacity: f64,
}

/// Rendering spec for an overlay layer, bound to its source by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub source: &'static str,
    pub paint: LinePaint,
}

/// The narrow interface the overlay managers need from the host map.
///
/// Implementations must tolerate removal of names that are not present
/// (the managers rely on remove being a no-op in that case). None of
/// these methods may be called while `is_style_ready()` is false; the
/// managers enforce that.
pub trait MapSurface: Send + Sync {
    fn is_style_ready(&self) -> bool;
    fn add_or_replace_source(&self, name: &str, data: FeatureCollection);
    fn add_or_replace_layer(&self, name: &str, spec: LayerSpec);
    fn remove_layer(&self, name: &str);
    fn remove_source(&self, name: &str);
    fn fit_viewport(&self, bounds: &BoundingBox, padding: f64, duration_ms: u64);
}

/// Replace an overlay as a unit: remove any prior incarnation, then
/// add the new source and layer. The layer goes last so it never
/// references a missing source; removal is the mirror image.
pub fn replace_overlay(
    surface: &dyn MapSurface,
    handle: OverlayHandle,
    data: FeatureCollection,
    spec: LayerSpec,
) {
    remove_overlay(surface, handle);
    surface.add_or_replace_source(handle.source, data);
    surface.add_or_replace_layer(handle.layer, spec);
}

/// Remove an overlay if present. Safe to call when it is not.
pub fn remove_overlay(surface: &dyn MapSurface, handle: OverlayHandle) {
    surface.remove_layer(handle.layer);
    surface.remove_source(handle.source);
}
