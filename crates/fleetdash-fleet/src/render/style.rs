//! Marker appearance.

use fleetdash_core::{Vehicle, VehicleStatus, WaypointKind};

/// Alert tags that mark a vehicle as critical.
pub const CRITICAL_ALERTS: &[&str] = &["breakdown", "emergency"];

/// Alert tags that mark a vehicle as needing attention.
pub const WARNING_ALERTS: &[&str] = &["delay", "detour", "speed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerSymbol {
    Cross,
    Exclamation,
    Triangle,
    Circle,
    Pin,
    Square,
    Flag,
}

impl MarkerSymbol {
    /// Single-character rendering for text surfaces.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            MarkerSymbol::Cross => 'x',
            MarkerSymbol::Exclamation => '!',
            MarkerSymbol::Triangle => '^',
            MarkerSymbol::Circle => 'o',
            MarkerSymbol::Pin => 'P',
            MarkerSymbol::Square => '#',
            MarkerSymbol::Flag => 'D',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerStyle {
    Offline,
    Critical,
    Warning,
    Alert,
    Normal,
    Pickup,
    Checkpoint,
    Drop,
}

impl MarkerStyle {
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            MarkerStyle::Offline => "#6b7280",
            MarkerStyle::Critical | MarkerStyle::Drop => "#dc2626",
            MarkerStyle::Warning => "#f97316",
            MarkerStyle::Alert | MarkerStyle::Checkpoint => "#2563eb",
            MarkerStyle::Normal | MarkerStyle::Pickup => "#16a34a",
        }
    }

    #[must_use]
    pub fn symbol(self) -> MarkerSymbol {
        match self {
            MarkerStyle::Offline => MarkerSymbol::Cross,
            MarkerStyle::Critical => MarkerSymbol::Exclamation,
            MarkerStyle::Warning => MarkerSymbol::Triangle,
            MarkerStyle::Alert | MarkerStyle::Normal => MarkerSymbol::Circle,
            MarkerStyle::Pickup => MarkerSymbol::Pin,
            MarkerStyle::Checkpoint => MarkerSymbol::Square,
            MarkerStyle::Drop => MarkerSymbol::Flag,
        }
    }
}

/// Primary marker style, by priority: offline, critical, warning, any
/// alert, normal.
#[must_use]
pub fn marker_style(vehicle: &Vehicle) -> MarkerStyle {
    if vehicle.status == VehicleStatus::ConnectionLost || vehicle.location.is_stale {
        MarkerStyle::Offline
    } else if vehicle.has_any_alert(CRITICAL_ALERTS) {
        MarkerStyle::Critical
    } else if vehicle.has_any_alert(WARNING_ALERTS) {
        MarkerStyle::Warning
    } else if !vehicle.alerts.is_empty() {
        MarkerStyle::Alert
    } else {
        MarkerStyle::Normal
    }
}

#[must_use]
pub fn waypoint_style(kind: WaypointKind) -> MarkerStyle {
    match kind {
        WaypointKind::Pickup => MarkerStyle::Pickup,
        WaypointKind::Checkpoint => MarkerStyle::Checkpoint,
        WaypointKind::Drop => MarkerStyle::Drop,
    }
}
