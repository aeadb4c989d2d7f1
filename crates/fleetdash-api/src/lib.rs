//! HTTP clients for the fleet REST API and the Google Maps web services.

pub mod client;
pub mod error;
pub mod maps;
pub mod polyline;
pub(crate) mod retry;
pub mod types;

pub use client::FleetApiClient;
pub use error::ApiError;
pub use maps::{DirectionsRoute, GoogleMapsClient};
pub use types::ActionAck;
