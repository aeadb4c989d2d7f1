//! Fleet visualization and alert pipeline.
//!
//! Raw backend records are normalized into canonical vehicles, drawn by the
//! [`render::MapRenderer`], and kept fresh by the
//! [`dashboard::DashboardController`]. Alerts arrive over a push channel
//! through the [`alerts::AlertStreamAdapter`]; driver-side sessions are
//! fed by the [`tracking::LocationTracker`].

pub mod alerts;
pub mod dashboard;
pub mod error;
pub mod geocode;
pub mod normalize;
pub mod render;
pub mod tracking;
pub mod ws;

pub use alerts::{
    active_only, ActionOutcome, AlertActions, AlertChannel, AlertStreamAdapter, AlertSubscription,
    Confirmer,
};
pub use dashboard::{
    DashboardController, DashboardSnapshot, DataSource, FleetSource, LoadState, MapAvailability,
    VehicleFilter, ViewMode,
};
pub use error::FleetError;
pub use geocode::{GeocodeCache, Geocoder, DEFAULT_CACHE_CAPACITY};
pub use normalize::{normalize_fleet, normalize_truck};
pub use render::{MapRenderer, MapSurface, RenderOptions, RoutePlanner};
pub use tracking::{LocationSink, LocationTracker, TrackingEnd};
pub use ws::WsAlertChannel;
