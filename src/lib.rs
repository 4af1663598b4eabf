//! # Routeviz Library
//!
//! Route-derived map visualizations: given a walking route between two
//! points, routeviz derives an elevation profile along it and a live
//! traffic-congestion overlay within its bounding area, and manages
//! both overlays safely against an asynchronously-loading map surface.
//!
//! ## Features
//!
//! - **Elevation profiles**: bounded-size sampling of the route
//!   geometry, batch elevation lookup, normalized profile rendering
//!   with min/max/range statistics
//! - **Traffic overlays**: periodic flow-segment polling, congestion
//!   scoring and color ramp, atomic replace-in-place layer swaps
//! - **Lifecycle safety**: stale responses are discarded against a
//!   freshness token; disable/teardown cancels timers and in-flight
//!   requests; teardown is idempotent
//! - **Pluggable collaborators**: routing/elevation/traffic providers
//!   and the map surface are traits, with HTTP implementations for
//!   OpenRouteService, OpenTopoData, and TomTom included
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use routeviz::Coordinate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let start = Coordinate::new(-74.0060, 40.7128)?;
//!     let end = Coordinate::new(-74.0000, 40.7200)?;
//!
//!     // Plan a walking route (reads ORS_API_KEY)
//!     let route = routeviz::plan_route(start, end, "foot-walking").await?;
//!
//!     // Derive its elevation profile
//!     let profile = routeviz::elevation_profile(&route).await?;
//!     println!(
//!         "climb range: {:.1} m over {} samples",
//!         profile.stats.range_m,
//!         profile.points.len()
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Overlay Management
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use routeviz::{
//!     RouteOverlayManager, RouteStyle, TomTomFlow, TrafficOverlayManager,
//!     DEFAULT_BBOX_BUFFER_DEG,
//! };
//! # async fn example(
//! #     surface: Arc<dyn routeviz::MapSurface>,
//! #     route: routeviz::RouteGeometry,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let route_overlay = RouteOverlayManager::new(surface.clone());
//! route_overlay.show(&route, &RouteStyle::default());
//!
//! let provider = Arc::new(TomTomFlow::from_env()?);
//! let mut traffic = TrafficOverlayManager::new(surface, provider);
//! traffic.enable(route.bounding_box(DEFAULT_BBOX_BUFFER_DEG)?);
//! // ... later
//! traffic.teardown();
//! # Ok(())
//! # }
//! ```

// Re-export core types that users might need
pub use crate::core::congestion::{
    congestion_color, congestion_level, CongestionBand, FlowSegment, CONGESTION_COLOR_STOPS,
};
pub use crate::core::elevation::{
    render_profile, ElevationProfile, ElevationSample, ElevationStats, ProfilePoint,
};
pub use crate::core::error::{suggest_profile, Error, Result, VALID_PROFILES};
pub use crate::core::geometry::{
    parse_lon_lat, sample_points, BoundingBox, Coordinate, RouteGeometry,
    DEFAULT_BBOX_BUFFER_DEG,
};
pub use crate::core::overlay::{
    remove_overlay, replace_overlay, Feature, FeatureCollection, Geometry, LayerSpec, LineColor,
    LinePaint, MapSurface, OverlayHandle, ROUTE_OVERLAY, TRAFFIC_OVERLAY,
};
pub use crate::core::providers::{
    ElevationProvider, OpenTopoData, OrsDirections, ProviderConfig, RoutingProvider, TomTomFlow,
    TrafficProvider,
};
pub use crate::core::route_layer::{RouteOverlayManager, RouteStyle};
pub use crate::core::traffic::{
    TrafficFault, TrafficOverlayManager, TrafficStatus, REFRESH_INTERVAL,
};

// Internal modules
mod core;

/// Maximum number of route points sent to the elevation service per
/// profile query. Longer routes are strided down to this bound.
pub const ELEVATION_MAX_SAMPLES: usize = 20;

/// Plan a route between two points with the default routing provider.
///
/// Reads the ORS_API_KEY environment variable.
///
/// # Examples
/// ```rust,no_run
/// # use routeviz::Coordinate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let start = Coordinate::new(4.3517, 50.8503)?;
/// let end = Coordinate::new(4.4025, 51.2194)?;
/// let route = routeviz::plan_route(start, end, "foot-walking").await?;
/// println!("{} m in {} s", route.distance_m, route.duration_s);
/// # Ok(())
/// # }
/// ```
pub async fn plan_route(start: Coordinate, end: Coordinate, profile: &str) -> Result<RouteGeometry> {
    let provider = OrsDirections::from_env()?;
    provider.request_route(start, end, profile).await
}

/// Fetch elevations along a route and render its profile.
///
/// The route is sampled down to [`ELEVATION_MAX_SAMPLES`] points
/// (always keeping the final point) before querying the default
/// elevation provider.
pub async fn elevation_profile(route: &RouteGeometry) -> Result<ElevationProfile> {
    let provider = OpenTopoData::new(&ProviderConfig::default());
    let sampled = sample_points(&route.coordinates, ELEVATION_MAX_SAMPLES);
    let samples = provider.request_elevations(&sampled).await?;
    render_profile(&samples)
}
