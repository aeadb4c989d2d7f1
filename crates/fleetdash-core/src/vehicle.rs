//! The canonical, render-ready vehicle view model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::Coordinates;
use crate::lenient::{lenient_or_default, lenient_string, lenient_timestamp};

pub const UNASSIGNED_DRIVER: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Available,
    InTransit,
    Maintenance,
    ConnectionLost,
}

impl VehicleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::InTransit => "in_transit",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::ConnectionLost => "connection_lost",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default)]
    pub is_stale: bool,
}

impl VehicleLocation {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointKind {
    Pickup,
    Checkpoint,
    Drop,
}

/// One stop along a vehicle's route. Order within
/// [`RouteData::waypoints`] is pickup, checkpoints, drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub kind: WaypointKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Waypoint {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// A route endpoint as known to the normalizer: an address, coordinates, or
/// both. The renderer geocodes the address when coordinates are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteEndpoint {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl RouteEndpoint {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.coordinates.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub pickup_location: Option<RouteEndpoint>,
    #[serde(default)]
    pub drop_location: Option<RouteEndpoint>,
    #[serde(default)]
    pub has_complete_route: bool,
    #[serde(default)]
    pub checkpoint_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TruckDetails {
    pub number: Option<String>,
    pub model: Option<String>,
    pub capacity: Option<String>,
    pub license_plate: Option<String>,
    pub customer_name: Option<String>,
    pub pickup_location: Option<String>,
    pub drop_location: Option<String>,
    /// Checkpoint display addresses, in route order.
    pub checkpoints: Vec<String>,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<String>,
    pub priority: Option<String>,
}

/// A vehicle ready for the list view and the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vehicle_id: String,
    pub location: VehicleLocation,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: VehicleStatus,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub alerts: BTreeSet<String>,
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub route_data: RouteData,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub truck_details: TruckDetails,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_level: Option<f64>,
}

fn default_driver() -> String {
    UNASSIGNED_DRIVER.to_string()
}

impl Vehicle {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        self.location.coordinates()
    }

    #[must_use]
    pub fn has_alert(&self, tag: &str) -> bool {
        self.alerts.contains(tag)
    }

    #[must_use]
    pub fn has_any_alert(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.alerts.contains(*t))
    }

    /// The vehicle position followed by every waypoint.
    pub fn all_points(&self) -> impl Iterator<Item = Coordinates> + '_ {
        std::iter::once(self.coordinates())
            .chain(self.route_data.waypoints.iter().map(Waypoint::coordinates))
    }

    /// Case-insensitive match over id, driver, plate, number, customer and address.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let d = &self.truck_details;
        [
            Some(self.vehicle_id.as_str()),
            Some(self.driver.as_str()),
            d.license_plate.as_deref(),
            d.number.as_deref(),
            d.customer_name.as_deref(),
            self.location.address.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
