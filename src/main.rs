//! # Routeviz CLI
//!
//! Command-line interface for the routeviz library.
//! Plans a walking route between two points and derives its
//! visualizations: an elevation profile and a traffic congestion view.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::error;

use routeviz::{
    congestion_level, parse_lon_lat, sample_points, suggest_profile, CongestionBand, Coordinate,
    ElevationProvider, OpenTopoData, OrsDirections, ProviderConfig, RouteGeometry,
    RouteOverlayManager, RouteStyle, RoutingProvider, TomTomFlow, TrafficOverlayManager,
    TrafficProvider, DEFAULT_BBOX_BUFFER_DEG, ELEVATION_MAX_SAMPLES,
};

mod cli;

/// Command-line interface for routeviz
#[derive(Parser)]
#[command(name = "routeviz")]
#[command(about = "Route planning with elevation profiles and live traffic congestion")]
#[command(long_about = "Plans a route and derives its visualizations:
  routeviz -74.0060,40.7128 -74.0000,40.7200                 # walking route summary
  routeviz -74.0060,40.7128 -74.0000,40.7200 --elevation     # plus elevation profile
  routeviz -74.0060,40.7128 -74.0000,40.7200 --traffic       # plus congestion snapshot
  routeviz -74.0060,40.7128 -74.0000,40.7200 --watch         # live congestion, Ctrl-C to stop

Credentials are read from the environment:
  ORS_API_KEY                      # OpenRouteService (routing)
  TOMTOM_API_KEY                   # TomTom (traffic)")]
#[command(version = env!("ROUTEVIZ_VERSION"))]
struct Cli {
    /// Start point as "lon,lat"
    #[arg(allow_hyphen_values = true)]
    start: String,

    /// End point as "lon,lat"
    #[arg(allow_hyphen_values = true)]
    end: String,

    /// Routing profile (e.g. foot-walking, cycling-regular, driving-car)
    #[arg(long, default_value = "foot-walking")]
    profile: String,

    /// Use the emergency route style
    #[arg(long)]
    emergency: bool,

    /// Fetch and print the elevation profile
    #[arg(long)]
    elevation: bool,

    /// Write the elevation profile as an SVG document to this path
    #[arg(long, value_name = "FILE")]
    svg: Option<String>,

    /// Fetch one traffic congestion snapshot for the route's area
    #[arg(long)]
    traffic: bool,

    /// Keep the traffic overlay live, refreshing every 2 minutes
    #[arg(long)]
    watch: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Error: {e:#}");
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🧭 Routeviz v{} starting...", env!("ROUTEVIZ_VERSION"));
    }

    // Catch profile typos before any network call
    if let Some(suggestion) = suggest_profile(&cli.profile) {
        anyhow::bail!(
            "unknown routing profile '{}'. Did you mean '{}'?",
            cli.profile,
            suggestion
        );
    }

    let start = parse_lon_lat(&cli.start).context("invalid start point")?;
    let end = parse_lon_lat(&cli.end).context("invalid end point")?;

    let route = plan_route(start, end, &cli.profile).await?;

    println!(
        "🚶 Route: {:.0} m, {:.1} min, {} points",
        route.distance_m,
        route.duration_s / 60.0,
        route.coordinates.len()
    );

    // Render the route line on the console surface, fitting the
    // viewport the way a map host would.
    let surface = Arc::new(cli::ConsoleSurface);
    let route_overlay = RouteOverlayManager::new(surface.clone());
    let style = if cli.emergency {
        RouteStyle::emergency()
    } else {
        RouteStyle::default()
    };
    route_overlay.show(&route, &style);

    if cli.elevation || cli.svg.is_some() {
        show_elevation(&route, cli.svg.as_deref()).await?;
    }

    if cli.traffic {
        show_traffic_snapshot(&route).await?;
    }

    if cli.watch {
        watch_traffic(&route, surface).await?;
    }

    Ok(())
}

async fn plan_route(
    start: Coordinate,
    end: Coordinate,
    profile: &str,
) -> anyhow::Result<RouteGeometry> {
    let provider = OrsDirections::from_env().context("routing provider unavailable")?;
    let route = cli::with_spinner(
        "🧭 Calculating route",
        provider.request_route(start, end, profile),
    )
    .await
    .context("route calculation failed")?;
    Ok(route)
}

async fn show_elevation(route: &RouteGeometry, svg_path: Option<&str>) -> anyhow::Result<()> {
    let provider = OpenTopoData::new(&ProviderConfig::default());
    let sampled = sample_points(&route.coordinates, ELEVATION_MAX_SAMPLES);

    let samples = cli::with_spinner(
        "⛰️  Fetching elevation profile",
        provider.request_elevations(&sampled),
    )
    .await
    .context("elevation lookup failed")?;

    match routeviz::render_profile(&samples) {
        Ok(profile) => {
            println!("⛰️  Elevation: {}", cli::ascii_profile(&profile));
            println!(
                "    min {:.1} m   max {:.1} m   change {:.1} m",
                profile.stats.min_m, profile.stats.max_m, profile.stats.range_m
            );
            if let Some(path) = svg_path {
                std::fs::write(path, profile.to_svg_document())
                    .with_context(|| format!("failed to write {path}"))?;
                println!("    profile written to {path}");
            }
        }
        Err(routeviz::Error::InsufficientData(_)) => {
            println!("⛰️  No elevation data available for this route");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

async fn show_traffic_snapshot(route: &RouteGeometry) -> anyhow::Result<()> {
    let provider = traffic_provider()?;
    let bounds = route.bounding_box(DEFAULT_BBOX_BUFFER_DEG)?;

    let segments = cli::with_spinner(
        "🚦 Fetching traffic flow",
        provider.request_flow_segments(&bounds),
    )
    .await
    .context("traffic lookup failed")?;

    if segments.is_empty() {
        println!("🚦 No flow segments reported in the route area");
        return Ok(());
    }

    println!("🚦 Traffic ({} segments):", segments.len());
    for segment in &segments {
        let level = congestion_level(segment);
        println!(
            "    {:>5.1} / {:>5.1} km/h   congestion {:>3.0}% ({})   {:.1} min vs {:.1} min",
            segment.current_speed,
            segment.free_flow_speed,
            level * 100.0,
            CongestionBand::classify(level).label(),
            segment.current_travel_time / 60.0,
            segment.free_flow_travel_time / 60.0,
        );
    }

    Ok(())
}

async fn watch_traffic(
    route: &RouteGeometry,
    surface: Arc<cli::ConsoleSurface>,
) -> anyhow::Result<()> {
    let provider: Arc<dyn TrafficProvider> = Arc::from(traffic_provider()?);
    let bounds = route.bounding_box(DEFAULT_BBOX_BUFFER_DEG)?;

    let mut manager = TrafficOverlayManager::new(surface, provider);
    manager.enable(bounds);

    eprintln!("🚦 Watching traffic (refresh every 2 minutes), Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("signal handler")?;

    manager.teardown();
    eprintln!("🚦 Traffic overlay torn down");

    Ok(())
}

fn traffic_provider() -> anyhow::Result<Box<dyn TrafficProvider>> {
    match TomTomFlow::from_env() {
        Ok(provider) => Ok(Box::new(provider)),
        Err(e) if e.is_configuration() => {
            anyhow::bail!("traffic is not configured: {e} (set TOMTOM_API_KEY to enable)")
        }
        Err(e) => Err(e.into()),
    }
}
