//! `vehicles` and `watch` command handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fleetdash_api::{FleetApiClient, GoogleMapsClient};
use fleetdash_core::{AppConfig, Tenant, Vehicle};
use fleetdash_fleet::{
    AlertStreamAdapter, DashboardController, DashboardSnapshot, DataSource, GeocodeCache,
    LoadState, MapAvailability, MapRenderer, RenderOptions, VehicleFilter, ViewMode,
    WsAlertChannel,
};

use crate::surface::TextSurface;

const MAP_COLS: usize = 72;
const MAP_ROWS: usize = 20;

pub(crate) struct WatchOptions {
    pub view: ViewMode,
    pub filter: VehicleFilter,
    pub search: String,
    pub show_routes: bool,
}

type TextRenderer = MapRenderer<TextSurface, GoogleMapsClient, GoogleMapsClient>;

pub(crate) fn tenant_from_config(config: &AppConfig) -> Tenant {
    Tenant::new(config.tenant_id.clone(), config.tenant_type)
}

/// Refresh once and print the canonical vehicle list.
///
/// # Errors
///
/// Returns an error if the client cannot be built, the refresh fails, or
/// JSON output cannot be serialized.
pub(crate) async fn run_vehicles(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let client = FleetApiClient::from_config(config)?;
    let dashboard = DashboardController::new(
        client,
        tenant_from_config(config),
        MapAvailability::for_config(config),
    );
    dashboard.refresh_now().await;
    let snapshot = dashboard.snapshot();

    if let LoadState::Error(message) = &snapshot.state {
        anyhow::bail!("fleet refresh failed: {message}");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.fleet)?);
    } else {
        print_vehicle_table(&snapshot.fleet, snapshot.source);
    }
    Ok(())
}

/// Run the dashboard with the alert subscription until a shutdown signal.
///
/// # Errors
///
/// Returns an error if the API or maps client cannot be built.
pub(crate) async fn run_watch(config: &AppConfig, options: WatchOptions) -> anyhow::Result<()> {
    let client = FleetApiClient::from_config(config)?;
    let tenant = tenant_from_config(config);

    let mut dashboard = DashboardController::new(
        client.clone(),
        tenant.clone(),
        MapAvailability::for_config(config),
    );
    dashboard.set_filter(options.filter);
    dashboard.set_search(options.search);
    dashboard.set_view_mode(options.view);

    let mut renderer = match GoogleMapsClient::from_config(config)? {
        Some(maps) => Some(build_renderer(config, maps, options.show_routes)),
        None => None,
    };

    let adapter = AlertStreamAdapter::new(WsAlertChannel::from_config(config), client);
    let subscription = adapter.subscribe(&tenant, dashboard.alert_sink());
    dashboard.attach_alerts(subscription);

    let mut updates = dashboard.subscribe();
    dashboard.start(Duration::from_secs(config.refresh_interval_secs));

    let shutdown = crate::shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                show_snapshot(&snapshot, renderer.as_mut()).await;
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}

fn build_renderer(config: &AppConfig, maps: GoogleMapsClient, show_routes: bool) -> TextRenderer {
    let geocoder = Arc::new(GeocodeCache::new(maps.clone(), config.geocode_cache_capacity));
    MapRenderer::new(
        TextSurface::new(MAP_COLS, MAP_ROWS),
        maps,
        geocoder,
        RenderOptions { show_routes },
    )
}

async fn show_snapshot(snapshot: &DashboardSnapshot, renderer: Option<&mut TextRenderer>) {
    match &snapshot.state {
        LoadState::Loading => {
            println!("Loading fleet...");
            return;
        }
        LoadState::Error(message) => println!("! refresh failed: {message}"),
        LoadState::Ready => {}
    }

    let visible = snapshot.visible();
    match snapshot.view_mode {
        ViewMode::List => print_vehicle_table(&visible, snapshot.source),
        ViewMode::Map => match (snapshot.map.ensure_ready(), renderer) {
            (Ok(()), Some(renderer)) => {
                let stats = renderer.render(&visible, Instant::now()).await;
                print!("{}", renderer.surface().draw());
                println!(
                    "{} vehicles, {} routes, {} straight",
                    stats.vehicles, stats.directions_routes, stats.fallback_routes
                );
            }
            (Err(e), _) => println!("[{e}] set FLEETDASH_MAPS_API_KEY to enable the map view"),
            (Ok(()), None) => println!("map view unavailable"),
        },
    }

    if !snapshot.alerts.is_empty() {
        println!("Active alerts:");
        for alert in &snapshot.alerts {
            println!(
                "  {:<10}{:<12}{:<10}{}",
                alert.id,
                alert.alert_type,
                alert.vehicle_id.as_deref().unwrap_or("-"),
                alert.message
            );
        }
    }
    println!();
}

fn print_vehicle_table(vehicles: &[Vehicle], source: DataSource) {
    match source {
        DataSource::Demo => {
            println!("no vehicles registered yet for this business");
            return;
        }
        DataSource::Fallback => println!("(showing tracking-service locations)"),
        DataSource::Primary => {}
    }
    if vehicles.is_empty() {
        println!("no vehicles match");
        return;
    }

    println!(
        "{:<12}{:<18}{:<17}{:<24}ALERTS",
        "VEHICLE", "DRIVER", "STATUS", "LOCATION"
    );
    for v in vehicles {
        let status = if v.location.is_stale {
            format!("{} (stale)", v.status)
        } else {
            v.status.to_string()
        };
        let location = v
            .location
            .address
            .clone()
            .unwrap_or_else(|| v.coordinates().to_string());
        let alerts = v.alerts.iter().cloned().collect::<Vec<_>>().join(",");
        println!(
            "{:<12}{:<18}{:<17}{:<24}{}",
            truncate(&v.vehicle_id, 11),
            truncate(&v.driver, 17),
            status,
            truncate(&location, 23),
            alerts
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}~", s.chars().take(max - 1).collect::<String>())
    } else {
        s.to_string()
    }
}
