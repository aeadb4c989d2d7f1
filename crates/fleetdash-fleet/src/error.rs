use fleetdash_api::ApiError;
use thiserror::Error;

/// Errors surfaced by the fleet pipeline.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected before any network call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("alert channel error: {0}")]
    Channel(String),

    #[error("Google Maps API key required")]
    MapsKeyRequired,
}
