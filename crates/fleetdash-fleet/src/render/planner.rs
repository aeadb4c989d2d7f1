use std::future::Future;

use fleetdash_api::{ApiError, DirectionsRoute, GoogleMapsClient};
use fleetdash_core::Coordinates;

/// Directions service used to draw road-following routes.
pub trait RoutePlanner: Send + Sync {
    /// # Errors
    ///
    /// Any error makes the renderer fall back to a straight polyline.
    fn plan(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        via: &[Coordinates],
    ) -> impl Future<Output = Result<DirectionsRoute, ApiError>> + Send;
}

impl RoutePlanner for GoogleMapsClient {
    fn plan(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        via: &[Coordinates],
    ) -> impl Future<Output = Result<DirectionsRoute, ApiError>> + Send {
        self.directions(origin, destination, via)
    }
}
