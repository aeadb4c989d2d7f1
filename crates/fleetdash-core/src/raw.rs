//! Raw truck/reservation records as returned by `/api/trucks/enhanced`.
//!
//! No field is guaranteed to be present, and several have more than one
//! historical spelling. Everything is `Option`/`Vec` so the normalizer can
//! degrade gracefully at every level.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::coords::Coordinates;
use crate::lenient::{
    lenient, lenient_bool, lenient_f64, lenient_string, lenient_timestamp, lenient_vec,
};

/// A coordinate object in either `{lat, lng}` or `{latitude, longitude}` form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCoordinates {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

impl RawCoordinates {
    #[must_use]
    pub fn lat_lng(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            ..Self::default()
        }
    }

    /// Resolves to a point when one of the two key variants carries two
    /// finite numbers. The short `lat`/`lng` pair wins when both are present.
    #[must_use]
    pub fn resolve(&self) -> Option<Coordinates> {
        let short = self.lat.zip(self.lng);
        let long = self.latitude.zip(self.longitude);
        short
            .and_then(|(lat, lng)| Coordinates::new(lat, lng))
            .or_else(|| long.and_then(|(lat, lng)| Coordinates::new(lat, lng)))
    }
}

/// A place reference: structured coordinates plus a display address.
///
/// History entries put the coordinate keys inline instead of under
/// `coordinates`; those are captured by `inline`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawLocationData {
    #[serde(default, deserialize_with = "lenient")]
    pub coordinates: Option<RawCoordinates>,
    #[serde(
        default,
        alias = "formattedAddress",
        alias = "fullAddress",
        deserialize_with = "lenient_string"
    )]
    pub address: Option<String>,
    #[serde(flatten)]
    pub inline: RawCoordinates,
}

impl RawLocationData {
    #[must_use]
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            coordinates: Some(RawCoordinates::lat_lng(lat, lng)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Only the nested `coordinates` object.
    #[must_use]
    pub fn structured_point(&self) -> Option<Coordinates> {
        self.coordinates.as_ref().and_then(RawCoordinates::resolve)
    }

    /// Nested `coordinates`, else inline coordinate keys.
    #[must_use]
    pub fn any_point(&self) -> Option<Coordinates> {
        self.structured_point().or_else(|| self.inline.resolve())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCheckpoint {
    #[serde(default, deserialize_with = "lenient")]
    pub location_data: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient")]
    pub coordinates: Option<RawCoordinates>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

impl RawCheckpoint {
    /// `locationData.coordinates` only.
    #[must_use]
    pub fn location_data_point(&self) -> Option<Coordinates> {
        self.location_data
            .as_ref()
            .and_then(RawLocationData::structured_point)
    }

    /// `locationData.coordinates`, else the checkpoint's own `coordinates`.
    #[must_use]
    pub fn any_point(&self) -> Option<Coordinates> {
        self.location_data_point()
            .or_else(|| self.coordinates.as_ref().and_then(RawCoordinates::resolve))
    }

    #[must_use]
    pub fn display_address(&self) -> Option<String> {
        self.location_data
            .as_ref()
            .and_then(|l| l.address.clone())
            .or_else(|| self.address.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReservationSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub pickup_location_data: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient")]
    pub drop_location_data: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub checkpoints: Vec<RawCheckpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReservationDetails {
    #[serde(default, deserialize_with = "lenient")]
    pub pickup_location_data: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient")]
    pub drop_location_data: Option<RawLocationData>,
}

/// Either a bare name or a driver profile object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDriver {
    Name(String),
    Profile(RawDriverProfile),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDriverProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
}

impl RawDriver {
    /// A non-blank display name, if the record carries one.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match self {
            RawDriver::Name(name) => {
                let name = name.trim();
                (!name.is_empty()).then(|| name.to_string())
            }
            RawDriver::Profile(p) => p.name.clone().or_else(|| p.display_name.clone()).or_else(|| {
                let full = [p.first_name.as_deref(), p.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                (!full.is_empty()).then_some(full)
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fuel_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndicators {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_alerts: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub low_fuel: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub maintenance_due: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub low_sentiment: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAlertTag {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub alert_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSentiment {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
}

/// One truck as returned by the enhanced fleet endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTruckRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub capacity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub license_plate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_reserved: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_location: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient")]
    pub reservation_summary: Option<RawReservationSummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub reservation_details: Option<RawReservationDetails>,
    #[serde(default, deserialize_with = "lenient")]
    pub pickup_location_data: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient")]
    pub drop_location_data: Option<RawLocationData>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub location_history: Vec<RawLocationData>,
    #[serde(default, deserialize_with = "lenient")]
    pub driver: Option<RawDriver>,
    #[serde(default, deserialize_with = "lenient")]
    pub metrics: Option<RawMetrics>,
    #[serde(default, deserialize_with = "lenient")]
    pub indicators: Option<RawIndicators>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub alerts: Vec<RawAlertTag>,
    #[serde(default, deserialize_with = "lenient")]
    pub sentiment: Option<RawSentiment>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coordinates_accept_both_key_variants() {
        let short: RawCoordinates = serde_json::from_value(json!({ "lat": 1.0, "lng": 2.0 })).unwrap();
        let long: RawCoordinates =
            serde_json::from_value(json!({ "latitude": "1.0", "longitude": "2.0" })).unwrap();
        assert_eq!(short.resolve(), long.resolve());
        assert_eq!(short.resolve(), Coordinates::new(1.0, 2.0));
    }

    #[test]
    fn half_coordinate_does_not_resolve() {
        let c: RawCoordinates = serde_json::from_value(json!({ "lat": 1.0, "longitude": 2.0 })).unwrap();
        assert!(c.resolve().is_none());
    }

    #[test]
    fn wrong_typed_fields_degrade_instead_of_failing() {
        let record: RawTruckRecord = serde_json::from_value(json!({
            "id": 42,
            "currentLocation": "somewhere",
            "reservationSummary": { "checkpoints": [ 7, { "address": "Dock 4" } ] },
            "alerts": "none",
            "metrics": { "fuelLevel": "12.5" },
            "isReserved": "true",
            "lastActiveAt": { "_seconds": 1_764_396_915 }
        }))
        .unwrap();

        assert_eq!(record.id.as_deref(), Some("42"));
        assert!(record.current_location.is_none());
        let summary = record.reservation_summary.unwrap();
        assert_eq!(summary.checkpoints.len(), 1);
        assert_eq!(summary.checkpoints[0].address.as_deref(), Some("Dock 4"));
        assert!(record.alerts.is_empty());
        assert_eq!(record.metrics.unwrap().fuel_level, Some(12.5));
        assert_eq!(record.is_reserved, Some(true));
        assert!(record.last_active_at.is_some());
    }

    #[test]
    fn history_entries_read_inline_coordinates() {
        let entry: RawLocationData =
            serde_json::from_value(json!({ "latitude": 3.5, "longitude": 4.5, "timestamp": 1 }))
                .unwrap();
        assert!(entry.structured_point().is_none());
        assert_eq!(entry.any_point(), Coordinates::new(3.5, 4.5));
    }

    #[test]
    fn driver_accepts_name_or_profile() {
        let bare: RawDriver = serde_json::from_value(json!("Ana Ruiz")).unwrap();
        let profile: RawDriver =
            serde_json::from_value(json!({ "firstName": "Ana", "lastName": "Ruiz" })).unwrap();
        assert_eq!(bare.display_name().as_deref(), Some("Ana Ruiz"));
        assert_eq!(profile.display_name().as_deref(), Some("Ana Ruiz"));
    }
}
