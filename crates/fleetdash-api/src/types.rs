//! Response envelopes for the fleet REST API and the Google Maps web services.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /api/trucks/enhanced`. Entries stay untyped so one malformed truck
/// cannot fail the whole batch.
#[derive(Debug, Deserialize)]
pub(crate) struct TrucksEnvelope {
    #[serde(default)]
    pub trucks: Vec<Value>,
}

/// `GET /api/tracking/vehicles/locations`.
#[derive(Debug, Deserialize)]
pub(crate) struct VehiclesEnvelope {
    #[serde(default)]
    pub vehicles: Vec<Value>,
}

/// `GET /api/tracking/sessions`.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionsEnvelope {
    #[serde(default)]
    pub sessions: Vec<Value>,
}

/// Outcome of a lifecycle POST (acknowledge, resolve, start, end, location).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionAck {
    pub success: bool,
    #[serde(alias = "error")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AcknowledgeBody<'a> {
    pub acknowledged_by: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResolveBody<'a> {
    pub resolved_by: &'a str,
    pub resolution: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapsLatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeGeometry {
    pub location: MapsLatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EncodedPolyline {
    pub points: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LegQuantity {
    pub value: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsLeg {
    #[serde(default)]
    pub distance: Option<LegQuantity>,
    #[serde(default)]
    pub duration: Option<LegQuantity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsRouteRaw {
    pub overview_polyline: EncodedPolyline,
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRouteRaw>,
}
