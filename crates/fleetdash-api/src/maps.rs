//! Client for the Google Maps Geocoding and Directions web services.

use std::time::Duration;

use fleetdash_core::{AppConfig, Coordinates};
use reqwest::{Client, Url};

use crate::client::{endpoint, parse_base_url, read_json};
use crate::error::ApiError;
use crate::polyline::decode_polyline;
use crate::types::{DirectionsResponse, GeocodeResponse};

/// The directions service accepts at most this many intermediate stops.
pub const MAX_DIRECTIONS_WAYPOINTS: usize = 25;

/// A driving route between two endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRoute {
    /// Decoded overview path, origin to destination.
    pub path: Vec<Coordinates>,
    pub distance_meters: u64,
    pub duration_secs: u64,
}

#[derive(Clone)]
pub struct GoogleMapsClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GoogleMapsClient {
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built or
    /// [`ApiError::InvalidBaseUrl`] for an unparseable `base_url`.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_owned(),
        })
    }

    /// Builds a client when the configuration carries a maps key.
    ///
    /// Returns `Ok(None)` without a key so callers can show the
    /// "key required" notice instead of a map.
    ///
    /// # Errors
    ///
    /// See [`GoogleMapsClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, ApiError> {
        match config.maps_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Self::new(&config.maps_base, key, config.request_timeout_secs).map(Some),
            None => Ok(None),
        }
    }

    /// Geocodes a free-text address to its best match.
    ///
    /// `ZERO_RESULTS` is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Maps`] for any other non-`OK` service status
    ///   (`REQUEST_DENIED`, `OVER_QUERY_LIMIT`, ...).
    /// - Transport/decoding errors.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, ApiError> {
        let mut url = endpoint(&self.base_url, &["maps", "api", "geocode", "json"]);
        url.query_pairs_mut()
            .append_pair("address", address)
            .append_pair("key", &self.api_key);

        let body = self.get(&url).await?;
        let response: GeocodeResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: "geocode".to_owned(),
                source: e,
            })?;

        match response.status.as_str() {
            "OK" => Ok(response
                .results
                .first()
                .and_then(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(ApiError::Maps {
                message: response.error_message.unwrap_or_default(),
                status: response.status,
            }),
        }
    }

    /// Requests a driving route from `origin` to `destination` through `via`
    /// in order. Stops beyond [`MAX_DIRECTIONS_WAYPOINTS`] are dropped.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Maps`] for a non-`OK` status, an empty route list, or
    ///   an undecodable overview polyline.
    /// - Transport/decoding errors.
    pub async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        via: &[Coordinates],
    ) -> Result<DirectionsRoute, ApiError> {
        if via.len() > MAX_DIRECTIONS_WAYPOINTS {
            tracing::debug!(
                requested = via.len(),
                kept = MAX_DIRECTIONS_WAYPOINTS,
                "truncating directions waypoints"
            );
        }
        let waypoints = via
            .iter()
            .take(MAX_DIRECTIONS_WAYPOINTS)
            .map(|c| c.to_query_value())
            .collect::<Vec<_>>()
            .join("|");

        let mut url = endpoint(&self.base_url, &["maps", "api", "directions", "json"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("origin", &origin.to_query_value());
            pairs.append_pair("destination", &destination.to_query_value());
            if !waypoints.is_empty() {
                pairs.append_pair("waypoints", &waypoints);
            }
            pairs.append_pair("mode", "driving");
            pairs.append_pair("key", &self.api_key);
        }

        let body = self.get(&url).await?;
        let response: DirectionsResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: "directions".to_owned(),
                source: e,
            })?;

        if response.status != "OK" {
            return Err(ApiError::Maps {
                message: response.error_message.unwrap_or_default(),
                status: response.status,
            });
        }

        let route = response.routes.into_iter().next().ok_or_else(|| ApiError::Maps {
            status: "OK".to_owned(),
            message: "no routes in response".to_owned(),
        })?;
        let path = decode_polyline(&route.overview_polyline.points).ok_or_else(|| ApiError::Maps {
            status: "OK".to_owned(),
            message: "undecodable overview polyline".to_owned(),
        })?;

        Ok(DirectionsRoute {
            path,
            distance_meters: route
                .legs
                .iter()
                .filter_map(|l| l.distance.as_ref().map(|q| q.value))
                .sum(),
            duration_secs: route
                .legs
                .iter()
                .filter_map(|l| l.duration.as_ref().map(|q| q.value))
                .sum(),
        })
    }

    async fn get(&self, url: &Url) -> Result<serde_json::Value, ApiError> {
        let response = self.client.get(url.clone()).send().await?;
        read_json(response, url).await
    }
}
