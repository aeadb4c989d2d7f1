//! HTTP client for the fleet REST API.
//!
//! Wraps `reqwest` with typed errors for the status codes that carry meaning
//! (404 not found, 410 expired), retry on transient failures for reads, and
//! per-entry decoding of list payloads so one malformed record is skipped
//! rather than failing the batch.

use std::time::Duration;

use fleetdash_core::{
    AlertStatistics, AppConfig, PositionSample, RawTruckRecord, Tenant, TrackingLinkRequest,
    TrackingLinkResponse, TrackingSession, Vehicle,
};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::retry::retry_with_backoff;
use crate::types::{
    AcknowledgeBody, ActionAck, ResolveBody, SessionsEnvelope, TrucksEnvelope, VehiclesEnvelope,
};

/// Client for the fleet REST API.
///
/// GET requests are retried on transient errors. POST requests are sent
/// once: sending a tracking link is not idempotent.
#[derive(Clone)]
pub struct FleetApiClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FleetApiClient {
    /// Creates a client rooted at `base_url` with retries disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` does not
    /// parse as an absolute URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Creates a client from application configuration, retries included.
    ///
    /// # Errors
    ///
    /// See [`FleetApiClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Ok(
            Self::new(&config.api_base, config.request_timeout_secs, &config.user_agent)?
                .with_retry(config.max_retries, config.retry_backoff_base_ms),
        )
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches the enhanced fleet list with reservation and sentiment data.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedStatus`] on transport or
    ///   status failures after retries.
    /// - [`ApiError::Rejected`] if the backend answers `"success": false`.
    /// - [`ApiError::Deserialize`] if the envelope is not JSON.
    pub async fn enhanced_trucks(
        &self,
        business_uid: Option<&str>,
    ) -> Result<Vec<RawTruckRecord>, ApiError> {
        let mut url = self.endpoint(&["api", "trucks", "enhanced"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("includeReserved", "true");
            pairs.append_pair("includeSentiment", "true");
            if let Some(uid) = business_uid {
                pairs.append_pair("businessUid", uid);
            }
        }

        let body = self.get_json(&url).await?;
        check_success(&body)?;
        let envelope: TrucksEnvelope = decode(body, "trucks/enhanced")?;
        Ok(decode_entries(envelope.trucks, "truck"))
    }

    /// Fetches already-shaped vehicle locations from the tracking service.
    ///
    /// Entries without usable coordinates fail to decode and are dropped.
    ///
    /// # Errors
    ///
    /// Same as [`FleetApiClient::enhanced_trucks`].
    pub async fn vehicle_locations(&self, company_id: Option<&str>) -> Result<Vec<Vehicle>, ApiError> {
        let mut url = self.endpoint(&["api", "tracking", "vehicles", "locations"]);
        if let Some(id) = company_id {
            url.query_pairs_mut().append_pair("companyId", id);
        }

        let body = self.get_json(&url).await?;
        check_success(&body)?;
        let envelope: VehiclesEnvelope = decode(body, "tracking/vehicles/locations")?;
        Ok(decode_entries(envelope.vehicles, "vehicle location"))
    }

    /// Lists tracking sessions that are currently active.
    ///
    /// # Errors
    ///
    /// Same as [`FleetApiClient::enhanced_trucks`].
    pub async fn active_sessions(&self) -> Result<Vec<TrackingSession>, ApiError> {
        let mut url = self.endpoint(&["api", "tracking", "sessions"]);
        url.query_pairs_mut().append_pair("status", "active");

        let body = self.get_json(&url).await?;
        check_success(&body)?;
        let envelope: SessionsEnvelope = decode(body, "tracking/sessions")?;
        Ok(decode_entries(envelope.sessions, "tracking session"))
    }

    /// Texts a tracking link to a driver's phone.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Rejected`] if the backend reports `success: false`.
    /// - Transport/status/decoding errors as for the other calls.
    pub async fn send_tracking_link(
        &self,
        request: &TrackingLinkRequest,
    ) -> Result<TrackingLinkResponse, ApiError> {
        let url = self.endpoint(&["api", "tracking", "send-tracking-link"]);
        let body = self.post_json(&url, request).await?;
        let response: TrackingLinkResponse = decode(body, "tracking/send-tracking-link")?;
        if !response.success {
            return Err(ApiError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "tracking link was not sent".to_string()),
            ));
        }
        Ok(response)
    }

    /// Marks a tracking session as started by the driver device.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] / [`ApiError::Expired`] for unknown or stale
    /// sessions; transport errors otherwise.
    pub async fn start_session(&self, session_id: &str) -> Result<ActionAck, ApiError> {
        self.session_action(session_id, "start", &serde_json::json!({}))
            .await
    }

    /// Pushes one position sample into a tracking session.
    ///
    /// # Errors
    ///
    /// See [`FleetApiClient::start_session`].
    pub async fn push_location(
        &self,
        session_id: &str,
        sample: &PositionSample,
    ) -> Result<ActionAck, ApiError> {
        self.session_action(session_id, "location", sample).await
    }

    /// Re-sends the tracking link for an existing session.
    ///
    /// # Errors
    ///
    /// See [`FleetApiClient::start_session`].
    pub async fn resend_link(&self, session_id: &str) -> Result<TrackingLinkResponse, ApiError> {
        let url = self.endpoint(&["api", "tracking", session_id, "resend"]);
        let body = self.post_json(&url, &serde_json::json!({})).await?;
        decode(body, "tracking/resend")
    }

    /// Ends a tracking session.
    ///
    /// # Errors
    ///
    /// See [`FleetApiClient::start_session`].
    pub async fn end_session(&self, session_id: &str) -> Result<ActionAck, ApiError> {
        self.session_action(session_id, "end", &serde_json::json!({}))
            .await
    }

    /// Fetches a session's public info.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`] (HTTP 404): the session never existed.
    /// - [`ApiError::Expired`] (HTTP 410): the session link has expired.
    /// - Transport/decoding errors otherwise.
    pub async fn session_info(&self, session_id: &str) -> Result<TrackingSession, ApiError> {
        let url = self.endpoint(&["api", "tracking", session_id, "info"]);
        let body = self.get_json(&url).await?;
        check_success(&body)?;
        decode(unwrap_field(body, "session"), "tracking/info")
    }

    /// Acknowledges an alert on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Transport/status/decoding errors. A `success: false` answer is
    /// returned as an [`ActionAck`], not an error.
    pub async fn acknowledge_alert(&self, alert_id: &str, actor: &str) -> Result<ActionAck, ApiError> {
        let url = self.endpoint(&["api", "alerts", alert_id, "acknowledge"]);
        let body = self
            .post_json(
                &url,
                &AcknowledgeBody {
                    acknowledged_by: actor,
                },
            )
            .await?;
        decode(body, "alerts/acknowledge")
    }

    /// Resolves an alert with a resolution note.
    ///
    /// # Errors
    ///
    /// See [`FleetApiClient::acknowledge_alert`].
    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        actor: &str,
        note: &str,
    ) -> Result<ActionAck, ApiError> {
        let url = self.endpoint(&["api", "alerts", alert_id, "resolve"]);
        let body = self
            .post_json(
                &url,
                &ResolveBody {
                    resolved_by: actor,
                    resolution: note,
                },
            )
            .await?;
        decode(body, "alerts/resolve")
    }

    /// Fetches the alert counters for a tenant.
    ///
    /// # Errors
    ///
    /// Same as [`FleetApiClient::enhanced_trucks`].
    pub async fn alert_statistics(&self, tenant: &Tenant) -> Result<AlertStatistics, ApiError> {
        let mut url = self.endpoint(&["api", "alerts", "stats"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(id) = &tenant.id {
                pairs.append_pair("tenantId", id);
            }
            pairs.append_pair("tenantType", tenant.tenant_type.as_str());
        }
        let body = self.get_json(&url).await?;
        check_success(&body)?;
        decode(unwrap_field(body, "stats"), "alerts/stats")
    }

    async fn session_action<B: Serialize + ?Sized>(
        &self,
        session_id: &str,
        action: &str,
        payload: &B,
    ) -> Result<ActionAck, ApiError> {
        let url = self.endpoint(&["api", "tracking", session_id, action]);
        let body = self.post_json(&url, payload).await?;
        decode(body, action)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base_url, segments)
    }

    async fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            read_json(response, url).await
        })
        .await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &Url, payload: &B) -> Result<Value, ApiError> {
        let response = self.client.post(url.clone()).json(payload).send().await?;
        read_json(response, url).await
    }
}

/// Normalises a base URL so that path segments append after it.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    let url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "URL cannot carry a path".to_owned(),
        });
    }
    Ok(url)
}

/// Appends percent-encoded path segments to `base`.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Asserts a 2xx status and parses the body as JSON.
pub(crate) async fn read_json(response: Response, url: &Url) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status, url));
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
        context: url.to_string(),
        source: e,
    })
}

fn decode<T: DeserializeOwned>(body: Value, context: &str) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

fn decode_entries<T: DeserializeOwned>(entries: Vec<Value>, kind: &str) -> Vec<T> {
    let total = entries.len();
    let decoded: Vec<T> = entries
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if decoded.len() < total {
        tracing::warn!(
            kind,
            skipped = total - decoded.len(),
            total,
            "skipping malformed entries in API response"
        );
    }
    decoded
}

/// Returns `body[field]` when present, else the body itself.
fn unwrap_field(mut body: Value, field: &str) -> Value {
    match body.get_mut(field).map(Value::take) {
        Some(inner) if !inner.is_null() => inner,
        _ => body,
    }
}

/// Checks the `"success"` flag some endpoints put in the envelope.
fn check_success(body: &Value) -> Result<(), ApiError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let msg = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ApiError::Rejected(msg));
    }
    Ok(())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
