use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient::{lenient_string, lenient_text, lenient_timestamp, string_id};

/// Alert types in the highest-severity emergency category.
pub const EMERGENCY_ALERT_TYPES: &[&str] = &["sos", "emergency"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "acknowledged" => Ok(Self::Acknowledged),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown alert status: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for AlertStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An alert as delivered by the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub alert_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub severity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vehicle_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Alert {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// SOS-class alerts: resolution needs a note and both lifecycle actions
    /// need an explicit confirmation.
    #[must_use]
    pub fn is_emergency(&self) -> bool {
        let kind = self.alert_type.trim();
        EMERGENCY_ALERT_TYPES
            .iter()
            .any(|t| kind.eq_ignore_ascii_case(t))
    }
}

/// Counter panel shown next to the alert list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertStatistics {
    pub total: u64,
    pub active: u64,
    pub acknowledged: u64,
    pub resolved: u64,
    pub critical: u64,
}
