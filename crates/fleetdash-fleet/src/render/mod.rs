//! Map rendering decisions.
//!
//! The renderer never draws pixels itself. It reconciles the canonical
//! vehicle list against a [`MapSurface`] and leaves drawing to the
//! surface implementation (a browser map, a terminal grid, a test
//! recorder).

mod info;
mod planner;
mod renderer;
mod style;
mod viewport;

use fleetdash_api::DirectionsRoute;
use fleetdash_core::{Bounds, Coordinates, WaypointKind};

pub use info::info_window_text;
pub use planner::RoutePlanner;
pub use renderer::{MapRenderer, RenderOptions, RenderStats, SELECT_PULSE};
pub use style::{
    marker_style, waypoint_style, MarkerStyle, MarkerSymbol, CRITICAL_ALERTS, WARNING_ALERTS,
};
pub use viewport::{world_px, zoom_for_bounds, FOCUS_ZOOM, MAX_ZOOM};

/// Handle to anything drawn on a surface.
pub type OverlayId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAnimation {
    Bounce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerRole {
    Vehicle {
        vehicle_id: String,
    },
    Waypoint {
        vehicle_id: String,
        kind: WaypointKind,
        checkpoint_index: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Coordinates,
    pub style: MarkerStyle,
    pub role: MarkerRole,
    pub title: String,
    /// Short text drawn on the marker itself (checkpoint numbers).
    pub label: Option<String>,
    /// Info-window body shown when the marker is opened.
    pub info: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u8,
    pub opacity: f64,
    pub dashed: bool,
}

/// Road-following route from the directions service.
pub const DIRECTIONS_LINE: LineStyle = LineStyle {
    color: "#2563eb",
    weight: 4,
    opacity: 0.8,
    dashed: false,
};

/// Straight segments between waypoints, drawn when directions fail.
pub const FALLBACK_LINE: LineStyle = LineStyle {
    color: "#6b7280",
    weight: 3,
    opacity: 0.7,
    dashed: true,
};

/// Drawing primitives the renderer needs from a map.
pub trait MapSurface {
    fn add_marker(&mut self, marker: MarkerSpec) -> OverlayId;

    fn add_polyline(&mut self, path: &[Coordinates], style: LineStyle) -> OverlayId;

    /// Draws a directions result. Surfaces with a native directions
    /// overlay can override this.
    fn add_route(&mut self, route: &DirectionsRoute) -> OverlayId {
        self.add_polyline(&route.path, DIRECTIONS_LINE)
    }

    /// Removes an overlay. Unknown ids are ignored.
    fn remove_overlay(&mut self, id: OverlayId);

    fn fit_bounds(&mut self, bounds: Bounds);

    fn zoom(&self) -> u8;

    fn set_zoom(&mut self, zoom: u8);

    fn pan_to(&mut self, center: Coordinates);

    fn set_animation(&mut self, marker: OverlayId, animation: Option<MarkerAnimation>);
}
