//! Traffic congestion overlay lifecycle
//!
//! Owns the periodic fetch → score → render cycle for the traffic
//! overlay: one polling task per enabled manager, cancellation on
//! disable/teardown/bounds change, and a generation counter as the
//! freshness token so a late response for superseded bounds is
//! discarded instead of applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::congestion::{congestion_level, FlowSegment, CONGESTION_COLOR_STOPS};
use crate::core::geometry::BoundingBox;
use crate::core::overlay::{
    remove_overlay, replace_overlay, Feature, FeatureCollection, LayerSpec, LineColor, LinePaint,
    MapSurface, TRAFFIC_OVERLAY,
};
use crate::core::providers::TrafficProvider;

/// Fixed refresh cadence while the overlay is enabled.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// Line width of the rendered flow segments.
const LINE_WIDTH: f64 = 4.0;
const LINE_OPACITY: f64 = 0.8;

/// Lifecycle state of the traffic overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficStatus {
    Disabled,
    Fetching,
    Rendered,
    TornDown,
}

/// Why the last refresh cycle failed.
///
/// "Not configured" (no provider credential) is surfaced separately
/// from transient failures so the host UI can explain the difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficFault {
    NotConfigured(String),
    Transient(String),
}

/// State shared between the manager handle and its polling task.
struct SharedState {
    /// Freshness token: bumped on every enable/update/disable. A
    /// response fetched under an older generation must not be applied.
    generation: AtomicU64,
    /// Serializes "check generation + mutate surface" so a cancel
    /// cannot interleave with a concurrent apply.
    apply: Mutex<()>,
    status: Mutex<TrafficStatus>,
    last_fault: Mutex<Option<TrafficFault>>,
    /// Whether a batch has ever been rendered under the current
    /// overlay (cleared when the overlay is removed).
    rendered: AtomicBool,
}

/// Manages the traffic congestion overlay on a borrowed map surface.
///
/// Requires a running tokio runtime: `enable` spawns the polling task.
pub struct TrafficOverlayManager {
    surface: Arc<dyn MapSurface>,
    provider: Arc<dyn TrafficProvider>,
    refresh: Duration,
    shared: Arc<SharedState>,
    worker: Option<(CancellationToken, JoinHandle<()>)>,
    torn_down: bool,
}

impl TrafficOverlayManager {
    pub fn new(surface: Arc<dyn MapSurface>, provider: Arc<dyn TrafficProvider>) -> Self {
        Self {
            surface,
            provider,
            refresh: REFRESH_INTERVAL,
            shared: Arc::new(SharedState {
                generation: AtomicU64::new(0),
                apply: Mutex::new(()),
                status: Mutex::new(TrafficStatus::Disabled),
                last_fault: Mutex::new(None),
                rendered: AtomicBool::new(false),
            }),
            worker: None,
            torn_down: false,
        }
    }

    /// Start (or restart) polling for the given bounds: one fetch
    /// immediately, then every [`REFRESH_INTERVAL`].
    pub fn enable(&mut self, bounds: BoundingBox) {
        if self.torn_down {
            log::warn!("traffic overlay already torn down, ignoring enable");
            return;
        }

        self.stop_worker();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.shared.status.lock().unwrap() = TrafficStatus::Fetching;
        *self.shared.last_fault.lock().unwrap() = None;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(
            Arc::clone(&self.surface),
            Arc::clone(&self.provider),
            Arc::clone(&self.shared),
            bounds,
            generation,
            self.refresh,
            token.clone(),
        ));
        self.worker = Some((token, handle));
    }

    /// The underlying route changed: supersede the current cycle and
    /// poll the new bounds. Does nothing while disabled or torn down.
    pub fn update_bounds(&mut self, bounds: BoundingBox) {
        if self.worker.is_none() {
            return;
        }
        self.enable(bounds);
    }

    /// Stop polling and remove the overlay. Safe to call repeatedly.
    pub fn disable(&mut self) {
        self.stop_worker();

        // Bump the generation before touching the surface so a fetch
        // that already completed cannot apply after our removal.
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let _guard = self.shared.apply.lock().unwrap();
        if self.surface.is_style_ready() {
            remove_overlay(self.surface.as_ref(), TRAFFIC_OVERLAY);
        }
        self.shared.rendered.store(false, Ordering::SeqCst);
        if !self.torn_down {
            *self.shared.status.lock().unwrap() = TrafficStatus::Disabled;
        }
    }

    /// Terminal teardown: disable and refuse any further enable.
    /// Idempotent; a second call finds nothing to remove and is fine.
    pub fn teardown(&mut self) {
        self.disable();
        self.torn_down = true;
        *self.shared.status.lock().unwrap() = TrafficStatus::TornDown;
    }

    pub fn status(&self) -> TrafficStatus {
        *self.shared.status.lock().unwrap()
    }

    /// The fault recorded by the most recent failed cycle, if any.
    /// Cleared by the next successful one.
    pub fn last_fault(&self) -> Option<TrafficFault> {
        self.shared.last_fault.lock().unwrap().clone()
    }

    fn stop_worker(&mut self) {
        if let Some((token, handle)) = self.worker.take() {
            token.cancel();
            handle.abort();
        }
    }
}

impl Drop for TrafficOverlayManager {
    fn drop(&mut self) {
        // The polling task must not outlive its manager. Overlay
        // removal needs the host's event loop and is the job of
        // teardown(), not drop.
        self.stop_worker();
    }
}

/// One polling cycle loop. Runs until cancelled or superseded.
async fn run_poll_loop(
    surface: Arc<dyn MapSurface>,
    provider: Arc<dyn TrafficProvider>,
    shared: Arc<SharedState>,
    bounds: BoundingBox,
    generation: u64,
    refresh: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        {
            let _guard = shared.apply.lock().unwrap();
            if shared.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            *shared.status.lock().unwrap() = TrafficStatus::Fetching;
        }

        // The fetch is the only suspension point in the cycle; a
        // cancel here drops the request on the floor.
        let result = tokio::select! {
            _ = token.cancelled() => return,
            r = provider.request_flow_segments(&bounds) => r,
        };

        let rendered = shared.rendered.load(Ordering::SeqCst);
        match result {
            Ok(segments) => {
                let _guard = shared.apply.lock().unwrap();
                if shared.generation.load(Ordering::SeqCst) != generation {
                    log::debug!("discarding stale traffic response");
                    return;
                }
                if !surface.is_style_ready() {
                    log::debug!("map style not ready, deferring traffic render");
                    *shared.status.lock().unwrap() = previous_status(rendered);
                    continue;
                }

                let (data, spec) = build_overlay(&segments);
                replace_overlay(surface.as_ref(), TRAFFIC_OVERLAY, data, spec);
                shared.rendered.store(true, Ordering::SeqCst);
                *shared.status.lock().unwrap() = TrafficStatus::Rendered;
                *shared.last_fault.lock().unwrap() = None;
                log::info!("traffic overlay refreshed: {} segments", segments.len());
            }
            Err(e) => {
                // Non-fatal: keep whatever is rendered, record the
                // fault, and let the next tick try again.
                let fault = if e.is_configuration() {
                    TrafficFault::NotConfigured(e.to_string())
                } else {
                    TrafficFault::Transient(e.to_string())
                };
                log::warn!("traffic refresh failed: {e}");

                let _guard = shared.apply.lock().unwrap();
                if shared.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                *shared.last_fault.lock().unwrap() = Some(fault);
                *shared.status.lock().unwrap() = previous_status(rendered);
            }
        }
    }
}

fn previous_status(rendered: bool) -> TrafficStatus {
    if rendered {
        TrafficStatus::Rendered
    } else {
        TrafficStatus::Fetching
    }
}

/// Transform a flow segment batch into the overlay payload: one line
/// feature per segment, congestion level recomputed and attached
/// alongside the raw measurements so hover/click handlers can present
/// them.
fn build_overlay(segments: &[FlowSegment]) -> (FeatureCollection, LayerSpec) {
    let features = segments
        .iter()
        .map(|segment| {
            Feature::line(
                segment.geometry.clone(),
                serde_json::json!({
                    "currentSpeed": segment.current_speed,
                    "freeFlowSpeed": segment.free_flow_speed,
                    "currentTravelTime": segment.current_travel_time,
                    "freeFlowTravelTime": segment.free_flow_travel_time,
                    "confidence": segment.confidence,
                    "congestionLevel": congestion_level(segment),
                }),
            )
        })
        .collect();

    let spec = LayerSpec {
        source: TRAFFIC_OVERLAY.source,
        paint: LinePaint {
            color: LineColor::Interpolate {
                property: "congestionLevel".to_string(),
                stops: CONGESTION_COLOR_STOPS
                    .iter()
                    .map(|&(level, color)| (level, color.to_string()))
                    .collect(),
            },
            width: LINE_WIDTH,
            opacity: LINE_OPACITY,
        },
    };

    (FeatureCollection::new(features), spec)
}
