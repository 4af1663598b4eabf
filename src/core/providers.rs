//! External data providers
//!
//! Routing, elevation, and traffic data come from third-party HTTP
//! services. Each concern is a small trait returning boxed futures so
//! the overlay managers can hold `Arc<dyn …>` handles; the HTTP
//! implementations here talk to OpenRouteService, OpenTopoData, and
//! the TomTom flow-segment API.

use std::time::Duration;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;

use crate::core::congestion::FlowSegment;
use crate::core::elevation::ElevationSample;
use crate::core::error::{is_valid_profile, suggest_profile, Error, Result};
use crate::core::geometry::{BoundingBox, Coordinate, RouteGeometry};

/// Maximum number of retry attempts for network errors
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Global HTTP client shared by all providers
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("routeviz/{}", env!("ROUTEVIZ_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Execute an operation with retry logic for network errors.
///
/// Used for routing and elevation requests, which are driven by an
/// explicit user action. Traffic requests are never retried inline:
/// the periodic poll is their retry.
async fn retry_on_network_error<F, Fut, T>(operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(Error::Network(msg)) if attempt < MAX_RETRY_ATTEMPTS => {
                attempt += 1;
                let delay = BASE_RETRY_DELAY_MS * (1 << (attempt - 1));
                log::warn!("Network error (attempt {attempt}): {msg}. Retrying in {delay}ms...");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Base URLs for the provider endpoints.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// OpenRouteService API root
    pub directions_base_url: String,

    /// OpenTopoData dataset endpoint
    pub elevation_base_url: String,

    /// TomTom flow-segment API root
    pub traffic_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            directions_base_url: "https://api.openrouteservice.org/v2".to_string(),
            elevation_base_url: "https://api.opentopodata.org/v1/ned10m".to_string(),
            traffic_base_url: "https://api.tomtom.com/traffic/services/4/flowSegmentData"
                .to_string(),
        }
    }
}

/// Calculates routes between two points.
pub trait RoutingProvider: Send + Sync {
    fn request_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: &str,
    ) -> BoxFuture<'static, Result<RouteGeometry>>;
}

/// Looks up terrain elevation for a batch of points.
pub trait ElevationProvider: Send + Sync {
    fn request_elevations(
        &self,
        points: &[Coordinate],
    ) -> BoxFuture<'static, Result<Vec<ElevationSample>>>;
}

/// Fetches traffic flow segments within a bounding box.
pub trait TrafficProvider: Send + Sync {
    fn request_flow_segments(
        &self,
        bounds: &BoundingBox,
    ) -> BoxFuture<'static, Result<Vec<FlowSegment>>>;
}

/// Format a bounding box as "minLon,minLat,maxLon,maxLat".
fn format_bbox(bounds: &BoundingBox) -> String {
    format!(
        "{},{},{},{}",
        bounds.southwest.lon, bounds.southwest.lat, bounds.northeast.lon, bounds.northeast.lat
    )
}

// ============ OpenRouteService directions ============

/// Directions client for the OpenRouteService API.
#[derive(Debug)]
pub struct OrsDirections {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
struct DirectionsFeature {
    geometry: DirectionsGeometry,
    #[serde(default)]
    properties: DirectionsProperties,
}

#[derive(Debug, Deserialize)]
struct DirectionsGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectionsProperties {
    summary: Option<DirectionsSummary>,
}

#[derive(Debug, Deserialize)]
struct DirectionsSummary {
    distance: f64,
    duration: f64,
}

impl OrsDirections {
    pub fn new(api_key: Option<String>, config: &ProviderConfig) -> Result<Self> {
        let api_key = api_key.ok_or(Error::MissingCredential("ORS_API_KEY"))?;
        Ok(Self {
            client: GLOBAL_CLIENT.clone(),
            base_url: config.directions_base_url.clone(),
            api_key,
        })
    }

    /// Build a client from the ORS_API_KEY environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var("ORS_API_KEY").ok(), &ProviderConfig::default())
    }

    async fn fetch_route(
        client: Client,
        url: String,
        api_key: String,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteGeometry> {
        let payload = serde_json::json!({
            "coordinates": [[start.lon, start.lat], [end.lon, end.lat]],
            "format": "geojson",
        });

        let response = retry_on_network_error(|| async {
            let response = client
                .post(&url)
                .header("Authorization", &api_key)
                .json(&payload)
                .send()
                .await?;
            Ok(response)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "no response body".to_string());
            return Err(Error::Routing {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: DirectionsResponse = response.json().await?;
        let feature = parsed.features.into_iter().next().ok_or(Error::Routing {
            status: status.as_u16(),
            message: "no route in response".to_string(),
        })?;

        let coordinates = feature
            .geometry
            .coordinates
            .into_iter()
            .map(Coordinate::try_from)
            .collect::<Result<Vec<_>>>()?;

        let (distance_m, duration_s) = feature
            .properties
            .summary
            .map(|s| (s.distance, s.duration))
            .unwrap_or((0.0, 0.0));

        RouteGeometry::new(coordinates, distance_m, duration_s)
    }
}

impl RoutingProvider for OrsDirections {
    fn request_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: &str,
    ) -> BoxFuture<'static, Result<RouteGeometry>> {
        if !is_valid_profile(profile) {
            let message = match suggest_profile(profile) {
                Some(suggestion) => {
                    format!("Unknown routing profile '{profile}'. Did you mean '{suggestion}'?")
                }
                None => format!("Unknown routing profile '{profile}'"),
            };
            return Box::pin(async move { Err(Error::InvalidInput(message)) });
        }

        let client = self.client.clone();
        let url = format!("{}/directions/{}/geojson", self.base_url, profile);
        let api_key = self.api_key.clone();

        Box::pin(Self::fetch_route(client, url, api_key, start, end))
    }
}

// ============ OpenTopoData elevation ============

/// Elevation client for the OpenTopoData API. No credential required.
pub struct OpenTopoData {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    /// Null over voids (open water, missing tiles)
    elevation: Option<f64>,
    location: ElevationLocation,
}

#[derive(Debug, Deserialize)]
struct ElevationLocation {
    lat: f64,
    lng: f64,
}

impl OpenTopoData {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: GLOBAL_CLIENT.clone(),
            base_url: config.elevation_base_url.clone(),
        }
    }

    async fn fetch_elevations(client: Client, url: String) -> Result<Vec<ElevationSample>> {
        let response = retry_on_network_error(|| async {
            let response = client.get(&url).send().await?;
            Ok(response)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Elevation(format!(
                "elevation service returned {status}"
            )));
        }

        let parsed: ElevationResponse = response.json().await?;

        // Points without data are skipped rather than failing the batch
        let samples = parsed
            .results
            .into_iter()
            .filter_map(|r| {
                let elevation_m = r.elevation?;
                let location = Coordinate::new(r.location.lng, r.location.lat).ok()?;
                Some(ElevationSample {
                    location,
                    elevation_m,
                })
            })
            .collect();

        Ok(samples)
    }
}

impl ElevationProvider for OpenTopoData {
    fn request_elevations(
        &self,
        points: &[Coordinate],
    ) -> BoxFuture<'static, Result<Vec<ElevationSample>>> {
        // The API expects "lat,lon" pairs separated by pipes
        let locations = points
            .iter()
            .map(|c| format!("{},{}", c.lat, c.lon))
            .collect::<Vec<_>>()
            .join("|");
        let url = format!("{}?locations={}", self.base_url, locations);
        let client = self.client.clone();

        Box::pin(Self::fetch_elevations(client, url))
    }
}

// ============ TomTom traffic flow ============

/// Flow-segment client for the TomTom traffic API.
#[derive(Debug)]
pub struct TomTomFlow {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FlowResponse {
    #[serde(rename = "flowSegmentData", default)]
    flow_segment_data: Vec<FlowSegmentData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowSegmentData {
    current_speed: f64,
    free_flow_speed: f64,
    current_travel_time: f64,
    free_flow_travel_time: f64,
    #[serde(default)]
    confidence: f64,
    coordinates: FlowCoordinates,
}

#[derive(Debug, Deserialize)]
struct FlowCoordinates {
    coordinate: Vec<FlowCoordinate>,
}

#[derive(Debug, Deserialize)]
struct FlowCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TomTomFlow {
    pub fn new(api_key: Option<String>, config: &ProviderConfig) -> Result<Self> {
        let api_key = api_key.ok_or(Error::MissingCredential("TOMTOM_API_KEY"))?;
        Ok(Self {
            client: GLOBAL_CLIENT.clone(),
            base_url: config.traffic_base_url.clone(),
            api_key,
        })
    }

    /// Build a client from the TOMTOM_API_KEY environment variable.
    ///
    /// A missing key is a configuration error, distinct from transient
    /// failures, so the caller can explain "feature not configured".
    pub fn from_env() -> Result<Self> {
        Self::new(
            std::env::var("TOMTOM_API_KEY").ok(),
            &ProviderConfig::default(),
        )
    }

    async fn fetch_segments(client: Client, url: String) -> Result<Vec<FlowSegment>> {
        let response = client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Traffic(format!("traffic service returned {status}")));
        }

        let parsed: FlowResponse = response.json().await?;

        let segments = parsed
            .flow_segment_data
            .into_iter()
            .map(|s| {
                let geometry = s
                    .coordinates
                    .coordinate
                    .into_iter()
                    .map(|c| Coordinate::new(c.longitude, c.latitude))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FlowSegment {
                    geometry,
                    current_speed: s.current_speed,
                    free_flow_speed: s.free_flow_speed,
                    current_travel_time: s.current_travel_time,
                    free_flow_travel_time: s.free_flow_travel_time,
                    confidence: s.confidence,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(segments)
    }
}

impl TrafficProvider for TomTomFlow {
    fn request_flow_segments(
        &self,
        bounds: &BoundingBox,
    ) -> BoxFuture<'static, Result<Vec<FlowSegment>>> {
        let url = format!(
            "{}/absolute/4/json?key={}&bbox={}",
            self.base_url,
            self.api_key,
            format_bbox(bounds)
        );
        let client = self.client.clone();

        Box::pin(Self::fetch_segments(client, url))
    }
}
