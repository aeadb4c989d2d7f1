//! Driver tracking sessions and the position samples pushed into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::Coordinates;
use crate::lenient::{lenient, lenient_string, lenient_timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Pending,
    Active,
    Ended,
    Expired,
    #[serde(other)]
    Unknown,
}

/// One geolocation fix from the driver's device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    #[must_use]
    pub fn new(at: Coordinates, accuracy: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: at.lat,
            longitude: at.lng,
            accuracy,
            heading: None,
            speed: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    #[serde(alias = "id")]
    pub session_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vehicle_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub driver_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_location: Option<PositionSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLinkRequest {
    pub phone: String,
    pub vehicle_id: String,
    pub driver_name: String,
    #[serde(default)]
    pub custom_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingLinkResponse {
    pub success: bool,
    /// Set when the backend has no SMS provider configured and only
    /// pretended to send.
    pub simulated: bool,
    pub session_id: Option<String>,
    pub tracking_url: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_session_status_maps_to_unknown() {
        let s: TrackingSession =
            serde_json::from_value(json!({ "sessionId": "s1", "status": "paused" })).unwrap();
        assert_eq!(s.status, SessionStatus::Unknown);
    }

    #[test]
    fn link_response_defaults_simulated_to_false() {
        let r: TrackingLinkResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(r.success);
        assert!(!r.simulated);
    }
}
