use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fleetdash_core::{Bounds, Coordinates, RouteEndpoint, Vehicle, Waypoint, WaypointKind};

use super::info::info_window_text;
use super::planner::RoutePlanner;
use super::style::{marker_style, waypoint_style};
use super::viewport::{FOCUS_ZOOM, MAX_ZOOM};
use super::{MapSurface, MarkerAnimation, MarkerRole, MarkerSpec, OverlayId, FALLBACK_LINE};
use crate::geocode::{GeocodeCache, Geocoder};

/// How long a selected vehicle's marker keeps bouncing.
pub const SELECT_PULSE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_routes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { show_routes: true }
    }
}

/// What one render cycle drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub vehicles: usize,
    pub waypoint_markers: usize,
    pub directions_routes: usize,
    pub fallback_routes: usize,
}

enum RouteOutcome {
    Directions,
    Straight,
    Skipped,
}

struct Pulse {
    vehicle_id: String,
    marker: OverlayId,
    until: Instant,
}

/// Redraws the fleet on a [`MapSurface`] with full-teardown semantics:
/// every cycle removes everything the previous one drew.
pub struct MapRenderer<S, P, G> {
    surface: S,
    planner: P,
    geocoder: Arc<GeocodeCache<G>>,
    options: RenderOptions,
    overlays: Vec<OverlayId>,
    vehicle_markers: HashMap<String, (OverlayId, Coordinates)>,
    focus: Option<Coordinates>,
    pulse: Option<Pulse>,
}

impl<S, P, G> MapRenderer<S, P, G>
where
    S: MapSurface,
    P: RoutePlanner,
    G: Geocoder,
{
    pub fn new(
        surface: S,
        planner: P,
        geocoder: Arc<GeocodeCache<G>>,
        options: RenderOptions,
    ) -> Self {
        Self {
            surface,
            planner,
            geocoder,
            options,
            overlays: Vec::new(),
            vehicle_markers: HashMap::new(),
            focus: None,
            pulse: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn set_show_routes(&mut self, show: bool) {
        self.options.show_routes = show;
    }

    /// Pins the viewport to a searched location. `None` restores
    /// fit-to-fleet on the next render.
    pub fn set_focus(&mut self, focus: Option<Coordinates>) {
        self.focus = focus;
    }

    /// Tears down the previous cycle and draws `vehicles`.
    pub async fn render(&mut self, vehicles: &[Vehicle], now: Instant) -> RenderStats {
        self.clear();
        let mut stats = RenderStats::default();

        for vehicle in vehicles {
            let marker = self.surface.add_marker(MarkerSpec {
                position: vehicle.coordinates(),
                style: marker_style(vehicle),
                role: MarkerRole::Vehicle {
                    vehicle_id: vehicle.vehicle_id.clone(),
                },
                title: format!("{} - {}", vehicle.vehicle_id, vehicle.driver),
                label: None,
                info: Some(info_window_text(vehicle)),
            });
            self.overlays.push(marker);
            self.vehicle_markers
                .insert(vehicle.vehicle_id.clone(), (marker, vehicle.coordinates()));
            stats.vehicles += 1;

            if vehicle.route_data.waypoints.is_empty() {
                continue;
            }
            if self.options.show_routes {
                match self.draw_route(vehicle).await {
                    RouteOutcome::Directions => stats.directions_routes += 1,
                    RouteOutcome::Straight => stats.fallback_routes += 1,
                    RouteOutcome::Skipped => {}
                }
            }
            for waypoint in &vehicle.route_data.waypoints {
                let id = self.surface.add_marker(waypoint_marker(vehicle, waypoint));
                self.overlays.push(id);
                stats.waypoint_markers += 1;
            }
        }

        self.fit_viewport(vehicles);
        self.restore_pulse(now);
        tracing::debug!(
            vehicles = stats.vehicles,
            waypoints = stats.waypoint_markers,
            directions = stats.directions_routes,
            fallback = stats.fallback_routes,
            "map rendered"
        );
        stats
    }

    /// Removes every overlay drawn by the last cycle.
    pub fn clear(&mut self) {
        for id in self.overlays.drain(..) {
            self.surface.remove_overlay(id);
        }
        self.vehicle_markers.clear();
    }

    /// Pans to a vehicle and pulses its marker for [`SELECT_PULSE`].
    ///
    /// Returns `false` if the vehicle is not on the map.
    pub fn select(&mut self, vehicle_id: &str, now: Instant) -> bool {
        let Some(&(marker, at)) = self.vehicle_markers.get(vehicle_id) else {
            return false;
        };
        self.stop_pulse();
        self.surface.pan_to(at);
        self.surface
            .set_animation(marker, Some(MarkerAnimation::Bounce));
        self.pulse = Some(Pulse {
            vehicle_id: vehicle_id.to_owned(),
            marker,
            until: now + SELECT_PULSE,
        });
        true
    }

    /// Ends an expired selection pulse.
    pub fn tick(&mut self, now: Instant) {
        if self.pulse.as_ref().is_some_and(|p| now >= p.until) {
            self.stop_pulse();
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.pulse.as_ref().map(|p| p.vehicle_id.as_str())
    }

    fn stop_pulse(&mut self) {
        if let Some(pulse) = self.pulse.take() {
            self.surface.set_animation(pulse.marker, None);
        }
    }

    /// Re-attaches a still-running pulse to the redrawn marker.
    fn restore_pulse(&mut self, now: Instant) {
        let Some(mut pulse) = self.pulse.take() else {
            return;
        };
        if now >= pulse.until {
            return;
        }
        if let Some(&(marker, _)) = self.vehicle_markers.get(&pulse.vehicle_id) {
            self.surface
                .set_animation(marker, Some(MarkerAnimation::Bounce));
            pulse.marker = marker;
            self.pulse = Some(pulse);
        }
    }

    async fn draw_route(&mut self, vehicle: &Vehicle) -> RouteOutcome {
        let route = &vehicle.route_data;
        let origin = self.resolve_endpoint(route.pickup_location.as_ref()).await;
        let destination = self.resolve_endpoint(route.drop_location.as_ref()).await;

        if let (Some(origin), Some(destination)) = (origin, destination) {
            let via: Vec<Coordinates> = route
                .waypoints
                .iter()
                .filter(|w| w.kind == WaypointKind::Checkpoint)
                .map(Waypoint::coordinates)
                .collect();
            match self.planner.plan(origin, destination, &via).await {
                Ok(directions) => {
                    let id = self.surface.add_route(&directions);
                    self.overlays.push(id);
                    return RouteOutcome::Directions;
                }
                Err(e) => tracing::debug!(
                    vehicle_id = %vehicle.vehicle_id,
                    error = %e,
                    "directions request failed, drawing straight route"
                ),
            }
        } else {
            tracing::debug!(
                vehicle_id = %vehicle.vehicle_id,
                "route endpoints unresolved, drawing straight route"
            );
        }

        let path: Vec<Coordinates> = route.waypoints.iter().map(Waypoint::coordinates).collect();
        if path.len() < 2 {
            return RouteOutcome::Skipped;
        }
        let id = self.surface.add_polyline(&path, FALLBACK_LINE);
        self.overlays.push(id);
        RouteOutcome::Straight
    }

    async fn resolve_endpoint(&self, endpoint: Option<&RouteEndpoint>) -> Option<Coordinates> {
        let endpoint = endpoint?;
        if let Some(at) = endpoint.coordinates {
            return Some(at);
        }
        self.geocoder.resolve(endpoint.address.as_deref()?).await
    }

    fn fit_viewport(&mut self, vehicles: &[Vehicle]) {
        if let Some(focus) = self.focus {
            self.surface.pan_to(focus);
            self.surface.set_zoom(FOCUS_ZOOM);
            return;
        }
        let Some(bounds) = Bounds::covering(vehicles.iter().flat_map(|v| v.all_points())) else {
            return;
        };
        self.surface.fit_bounds(bounds);
        if self.surface.zoom() > MAX_ZOOM {
            self.surface.set_zoom(MAX_ZOOM);
        }
    }
}

fn waypoint_marker(vehicle: &Vehicle, waypoint: &Waypoint) -> MarkerSpec {
    let (title, label) = match waypoint.kind {
        WaypointKind::Pickup => ("Pickup".to_string(), Some("P".to_string())),
        WaypointKind::Drop => ("Drop".to_string(), Some("D".to_string())),
        WaypointKind::Checkpoint => {
            let n = waypoint.checkpoint_index.map_or(0, |i| i + 1);
            (format!("Checkpoint {n}"), Some(n.to_string()))
        }
    };
    let info = [waypoint.address.as_deref(), waypoint.details.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");

    MarkerSpec {
        position: waypoint.coordinates(),
        style: waypoint_style(waypoint.kind),
        role: MarkerRole::Waypoint {
            vehicle_id: vehicle.vehicle_id.clone(),
            kind: waypoint.kind,
            checkpoint_index: waypoint.checkpoint_index,
        },
        title: format!("{title} ({})", vehicle.vehicle_id),
        label,
        info: (!info.is_empty()).then_some(info),
    }
}

#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;
