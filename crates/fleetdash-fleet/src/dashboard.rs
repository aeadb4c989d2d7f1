//! Dashboard refresh orchestration.
//!
//! The controller owns the periodic refresh timer, the load state and the
//! operator's filter/view choices, and publishes every change as a
//! [`DashboardSnapshot`] over a `watch` channel.
//!
//! Timer ticks and manual requests each spawn an independent refresh with
//! no mutual exclusion, so the refresh that resolves last wins. Teardown
//! bumps an epoch; refreshes started under an older epoch are discarded
//! when they complete.

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fleetdash_api::{ApiError, FleetApiClient};
use fleetdash_core::{Alert, AppConfig, RawTruckRecord, Tenant, Vehicle, VehicleStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::alerts::AlertSubscription;
use crate::error::FleetError;
use crate::normalize::normalize_fleet;

/// Where the fleet list comes from.
pub trait FleetSource: Send + Sync + 'static {
    /// Raw truck and reservation records for the tenant.
    fn enhanced_trucks(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<Vec<RawTruckRecord>, ApiError>> + Send;

    /// Already-shaped vehicles, used when the enhanced endpoint has nothing.
    fn fallback_vehicles(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<Vec<Vehicle>, ApiError>> + Send;
}

impl FleetSource for FleetApiClient {
    fn enhanced_trucks(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<Vec<RawTruckRecord>, ApiError>> + Send {
        FleetApiClient::enhanced_trucks(self, tenant.id.as_deref())
    }

    fn fallback_vehicles(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<Vec<Vehicle>, ApiError>> + Send {
        self.vehicle_locations(tenant.id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Only shown before the first refresh completes.
    Loading,
    Error(String),
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Primary,
    Fallback,
    /// Business tenant with no vehicles anywhere. Nothing synthetic is shown.
    Demo,
}

impl DataSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Primary => "primary",
            DataSource::Fallback => "fallback",
            DataSource::Demo => "demo",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,
    Map,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "map" => Ok(ViewMode::Map),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VehicleFilter {
    #[default]
    All,
    Status(VehicleStatus),
    WithAlerts,
}

impl VehicleFilter {
    #[must_use]
    pub fn matches(self, vehicle: &Vehicle) -> bool {
        match self {
            VehicleFilter::All => true,
            VehicleFilter::Status(status) => vehicle.status == status,
            VehicleFilter::WithAlerts => !vehicle.alerts.is_empty(),
        }
    }
}

impl FromStr for VehicleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim().to_ascii_lowercase().as_str() {
            "all" => VehicleFilter::All,
            "with_alerts" | "alerts" => VehicleFilter::WithAlerts,
            "available" => VehicleFilter::Status(VehicleStatus::Available),
            "in_transit" => VehicleFilter::Status(VehicleStatus::InTransit),
            "maintenance" => VehicleFilter::Status(VehicleStatus::Maintenance),
            "connection_lost" | "offline" => VehicleFilter::Status(VehicleStatus::ConnectionLost),
            other => return Err(format!("unknown vehicle filter '{other}'")),
        };
        Ok(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapAvailability {
    Ready,
    /// No maps key configured; the map view shows a blocking notice.
    KeyRequired,
}

impl MapAvailability {
    #[must_use]
    pub fn for_config(config: &AppConfig) -> Self {
        if config.has_maps_key() {
            MapAvailability::Ready
        } else {
            MapAvailability::KeyRequired
        }
    }

    /// # Errors
    ///
    /// [`FleetError::MapsKeyRequired`] when no maps key is configured.
    pub fn ensure_ready(self) -> Result<(), FleetError> {
        match self {
            MapAvailability::Ready => Ok(()),
            MapAvailability::KeyRequired => Err(FleetError::MapsKeyRequired),
        }
    }
}

/// Everything a view needs to draw the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub state: LoadState,
    pub source: DataSource,
    /// Canonical vehicles from the last successful refresh.
    pub fleet: Vec<Vehicle>,
    /// Active alerts from the last pushed snapshot.
    pub alerts: Vec<Alert>,
    pub filter: VehicleFilter,
    pub search: String,
    pub view_mode: ViewMode,
    pub map: MapAvailability,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    fn initial(map: MapAvailability) -> Self {
        Self {
            state: LoadState::Loading,
            source: DataSource::Primary,
            fleet: Vec::new(),
            alerts: Vec::new(),
            filter: VehicleFilter::All,
            search: String::new(),
            view_mode: ViewMode::List,
            map,
            last_refreshed: None,
        }
    }

    /// The fleet with live alert types merged into each vehicle's tags.
    #[must_use]
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.fleet
            .iter()
            .cloned()
            .map(|mut vehicle| {
                let live = self
                    .alerts
                    .iter()
                    .filter(|a| a.vehicle_id.as_deref() == Some(vehicle.vehicle_id.as_str()))
                    .map(|a| a.alert_type.trim().to_ascii_lowercase())
                    .filter(|tag| !tag.is_empty());
                vehicle.alerts.extend(live);
                vehicle
            })
            .collect()
    }

    /// Vehicles passing the current filter and search.
    #[must_use]
    pub fn visible(&self) -> Vec<Vehicle> {
        self.vehicles()
            .into_iter()
            .filter(|v| self.filter.matches(v) && v.matches_search(&self.search))
            .collect()
    }

    #[must_use]
    pub fn is_initial_load(&self) -> bool {
        self.state == LoadState::Loading
    }
}

struct Shared {
    epoch: AtomicU64,
    snapshot: watch::Sender<DashboardSnapshot>,
}

impl Shared {
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }
}

pub struct DashboardController<S> {
    source: Arc<S>,
    tenant: Tenant,
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
    manual: Option<mpsc::Sender<()>>,
    alerts: Option<AlertSubscription>,
}

impl<S: FleetSource> DashboardController<S> {
    pub fn new(source: S, tenant: Tenant, map: MapAvailability) -> Self {
        let (snapshot, _) = watch::channel(DashboardSnapshot::initial(map));
        Self {
            source: Arc::new(source),
            tenant,
            shared: Arc::new(Shared {
                epoch: AtomicU64::new(0),
                snapshot,
            }),
            timer: None,
            manual: None,
            alerts: None,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.shared.snapshot.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn set_filter(&self, filter: VehicleFilter) {
        self.shared.snapshot.send_modify(|s| s.filter = filter);
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.shared.snapshot.send_modify(|s| s.search = search);
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.shared.snapshot.send_modify(|s| s.view_mode = mode);
    }

    /// Replaces the live alert list.
    pub fn apply_alerts(&self, alerts: Vec<Alert>) {
        self.shared.snapshot.send_modify(|s| s.alerts = alerts);
    }

    /// Callback for [`crate::AlertStreamAdapter::subscribe`] that feeds
    /// pushed snapshots into this dashboard until teardown.
    pub fn alert_sink(&self) -> impl FnMut(Vec<Alert>) + Send + 'static {
        let shared = Arc::clone(&self.shared);
        let epoch = shared.epoch.load(Ordering::SeqCst);
        move |alerts| {
            if shared.is_current(epoch) {
                shared.snapshot.send_modify(|s| s.alerts = alerts);
            }
        }
    }

    /// Keeps the alert subscription alive until teardown.
    pub fn attach_alerts(&mut self, subscription: AlertSubscription) {
        self.alerts = Some(subscription);
    }

    /// Runs one refresh on the caller's task.
    pub async fn refresh_now(&self) {
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        run_refresh(
            Arc::clone(&self.source),
            self.tenant.clone(),
            Arc::clone(&self.shared),
            epoch,
        )
        .await;
    }

    /// Starts the refresh timer. The first refresh fires immediately.
    pub fn start(&mut self, period: Duration) {
        if self.timer.is_some() {
            return;
        }
        let (manual_tx, mut manual_rx) = mpsc::channel::<()>(4);
        let source = Arc::clone(&self.source);
        let tenant = self.tenant.clone();
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    request = manual_rx.recv() => {
                        if request.is_none() {
                            break;
                        }
                        tracing::debug!("manual refresh requested");
                    }
                }
                let epoch = shared.epoch.load(Ordering::SeqCst);
                tokio::spawn(run_refresh(
                    Arc::clone(&source),
                    tenant.clone(),
                    Arc::clone(&shared),
                    epoch,
                ));
            }
        });

        self.timer = Some(task);
        self.manual = Some(manual_tx);
        tracing::info!(period_secs = period.as_secs(), "dashboard refresh started");
    }

    /// Asks the timer task for an out-of-band refresh. Returns `false` if
    /// the controller is not running or a request is already queued.
    pub fn request_refresh(&self) -> bool {
        self.manual
            .as_ref()
            .is_some_and(|tx| tx.try_send(()).is_ok())
    }

    /// Stops the timer, unsubscribes from alerts and discards any refresh
    /// still in flight.
    pub async fn shutdown(&mut self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.manual = None;
        if let Some(subscription) = self.alerts.take() {
            subscription.unsubscribe().await;
        }
        tracing::info!("dashboard stopped");
    }
}

impl<S> Drop for DashboardController<S> {
    fn drop(&mut self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = &self.timer {
            timer.abort();
        }
    }
}

async fn run_refresh<S: FleetSource>(
    source: Arc<S>,
    tenant: Tenant,
    shared: Arc<Shared>,
    epoch: u64,
) {
    let result = fetch_fleet(source.as_ref(), &tenant, Utc::now()).await;
    if !shared.is_current(epoch) {
        tracing::debug!("discarding refresh finished after teardown");
        return;
    }
    match result {
        Ok((data_source, fleet)) => {
            tracing::info!(
                source = data_source.as_str(),
                vehicles = fleet.len(),
                "fleet refreshed"
            );
            shared.snapshot.send_modify(|s| {
                s.state = LoadState::Ready;
                s.source = data_source;
                s.fleet = fleet;
                s.last_refreshed = Some(Utc::now());
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "fleet refresh failed");
            shared
                .snapshot
                .send_modify(|s| s.state = LoadState::Error(e.to_string()));
        }
    }
}

/// Enhanced endpoint first; fallback when it is empty or fails.
async fn fetch_fleet<S: FleetSource>(
    source: &S,
    tenant: &Tenant,
    now: DateTime<Utc>,
) -> Result<(DataSource, Vec<Vehicle>), ApiError> {
    match source.enhanced_trucks(tenant).await {
        Ok(records) if !records.is_empty() => {
            return Ok((DataSource::Primary, normalize_fleet(&records, now)));
        }
        Ok(_) => tracing::debug!("enhanced endpoint returned no trucks, trying fallback"),
        Err(e) => tracing::warn!(error = %e, "enhanced fetch failed, trying fallback"),
    }

    let vehicles = source.fallback_vehicles(tenant).await?;
    if vehicles.is_empty() && tenant.is_business() {
        return Ok((DataSource::Demo, vehicles));
    }
    Ok((DataSource::Fallback, vehicles))
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
