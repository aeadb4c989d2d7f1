//! Shared domain types and configuration for the fleet dashboard.
//!
//! Raw API record shapes live in [`raw`]; the canonical, render-ready view
//! models live in [`vehicle`], [`alert`], and [`tracking`].

pub mod alert;
pub mod app_config;
pub mod config;
pub mod coords;
mod lenient;
pub mod raw;
pub mod tenant;
pub mod tracking;
pub mod vehicle;

use thiserror::Error;

pub use alert::{Alert, AlertStatistics, AlertStatus};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use coords::{Bounds, Coordinates};
pub use lenient::parse_timestamp;
pub use raw::RawTruckRecord;
pub use tenant::{Tenant, TenantType};
pub use tracking::{
    PositionSample, SessionStatus, TrackingLinkRequest, TrackingLinkResponse, TrackingSession,
};
pub use vehicle::{
    RouteData, RouteEndpoint, TruckDetails, Vehicle, VehicleLocation, VehicleStatus, Waypoint,
    WaypointKind,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
