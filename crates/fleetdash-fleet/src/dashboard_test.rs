use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::Mutex;

use fleetdash_core::TenantType;
use serde_json::json;
use tokio::sync::{oneshot, Notify};

use super::*;

enum Reply<T> {
    Ok(T),
    Fail,
}

fn unavailable() -> ApiError {
    ApiError::UnexpectedStatus {
        status: 503,
        url: "http://fleet.test/api".into(),
    }
}

struct FakeSource {
    enhanced: Mutex<Reply<Vec<RawTruckRecord>>>,
    fallback: Mutex<Reply<Vec<Vehicle>>>,
    enhanced_calls: AtomicUsize,
    fallback_calls: AtomicUsize,
    entered: Arc<Notify>,
    gate: Option<Arc<Notify>>,
}

impl FakeSource {
    fn new(enhanced: Reply<Vec<RawTruckRecord>>, fallback: Reply<Vec<Vehicle>>) -> Self {
        Self {
            enhanced: Mutex::new(enhanced),
            fallback: Mutex::new(fallback),
            enhanced_calls: AtomicUsize::new(0),
            fallback_calls: AtomicUsize::new(0),
            entered: Arc::new(Notify::new()),
            gate: None,
        }
    }
}

impl FleetSource for FakeSource {
    async fn enhanced_trucks(&self, _tenant: &Tenant) -> Result<Vec<RawTruckRecord>, ApiError> {
        self.enhanced_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &*self.enhanced.lock().unwrap() {
            Reply::Ok(records) => Ok(records.clone()),
            Reply::Fail => Err(unavailable()),
        }
    }

    async fn fallback_vehicles(&self, _tenant: &Tenant) -> Result<Vec<Vehicle>, ApiError> {
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        match &*self.fallback.lock().unwrap() {
            Reply::Ok(vehicles) => Ok(vehicles.clone()),
            Reply::Fail => Err(unavailable()),
        }
    }
}

/// Each enhanced call waits on its own reply, so a test decides the order in
/// which overlapping refreshes resolve.
struct ScriptedSource {
    pending: Mutex<VecDeque<oneshot::Receiver<Result<Vec<RawTruckRecord>, ApiError>>>>,
}

impl FleetSource for ScriptedSource {
    async fn enhanced_trucks(&self, _tenant: &Tenant) -> Result<Vec<RawTruckRecord>, ApiError> {
        let pending = self.pending.lock().unwrap().pop_front();
        match pending {
            Some(reply) => reply.await.unwrap_or_else(|_| Err(unavailable())),
            None => Ok(Vec::new()),
        }
    }

    async fn fallback_vehicles(&self, _tenant: &Tenant) -> Result<Vec<Vehicle>, ApiError> {
        Ok(Vec::new())
    }
}

fn business() -> Tenant {
    Tenant::new(Some("biz-1".into()), TenantType::Business)
}

fn raw_truck(id: &str) -> RawTruckRecord {
    serde_json::from_value(json!({
        "id": id,
        "status": "available",
        "driver": { "name": "Ana" },
        "currentLocation": { "coordinates": { "lat": 10.0, "lng": 20.0 }, "address": "Depot 4" }
    }))
    .unwrap()
}

fn fallback_vehicle(id: &str) -> Vehicle {
    serde_json::from_value(json!({
        "vehicleId": id,
        "location": { "latitude": 1.0, "longitude": 2.0 },
        "status": "in_transit"
    }))
    .unwrap()
}

fn alert(id: &str, kind: &str, vehicle: &str) -> Alert {
    serde_json::from_value(json!({
        "id": id,
        "type": kind,
        "vehicleId": vehicle,
        "status": "active"
    }))
    .unwrap()
}

fn controller(source: FakeSource) -> DashboardController<FakeSource> {
    DashboardController::new(source, business(), MapAvailability::Ready)
}

#[tokio::test]
async fn starts_loading_then_ready_from_primary() {
    let dash = controller(FakeSource::new(
        Reply::Ok(vec![raw_truck("T-1")]),
        Reply::Ok(Vec::new()),
    ));
    assert!(dash.snapshot().is_initial_load());

    dash.refresh_now().await;

    let snap = dash.snapshot();
    assert_eq!(snap.state, LoadState::Ready);
    assert_eq!(snap.source, DataSource::Primary);
    assert_eq!(snap.fleet.len(), 1);
    assert!(snap.last_refreshed.is_some());
    assert_eq!(dash.source.fallback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_enhanced_uses_fallback() {
    let dash = controller(FakeSource::new(
        Reply::Ok(Vec::new()),
        Reply::Ok(vec![fallback_vehicle("F-1")]),
    ));
    dash.refresh_now().await;

    let snap = dash.snapshot();
    assert_eq!(snap.source, DataSource::Fallback);
    assert_eq!(snap.fleet[0].vehicle_id, "F-1");
}

#[tokio::test]
async fn failed_enhanced_falls_through_to_fallback() {
    let dash = controller(FakeSource::new(
        Reply::Fail,
        Reply::Ok(vec![fallback_vehicle("F-1")]),
    ));
    dash.refresh_now().await;

    let snap = dash.snapshot();
    assert_eq!(snap.state, LoadState::Ready);
    assert_eq!(snap.source, DataSource::Fallback);
}

#[tokio::test]
async fn empty_business_fleet_is_flagged_demo() {
    let dash = controller(FakeSource::new(Reply::Ok(Vec::new()), Reply::Ok(Vec::new())));
    dash.refresh_now().await;

    let snap = dash.snapshot();
    assert_eq!(snap.source, DataSource::Demo);
    assert!(snap.fleet.is_empty());
}

#[tokio::test]
async fn empty_admin_fleet_stays_fallback() {
    let dash = DashboardController::new(
        FakeSource::new(Reply::Ok(Vec::new()), Reply::Ok(Vec::new())),
        Tenant::new(None, TenantType::Admin),
        MapAvailability::Ready,
    );
    dash.refresh_now().await;
    assert_eq!(dash.snapshot().source, DataSource::Fallback);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_vehicles() {
    let dash = controller(FakeSource::new(
        Reply::Ok(vec![raw_truck("T-1")]),
        Reply::Ok(Vec::new()),
    ));
    dash.refresh_now().await;

    *dash.source.enhanced.lock().unwrap() = Reply::Fail;
    *dash.source.fallback.lock().unwrap() = Reply::Fail;
    dash.refresh_now().await;

    let snap = dash.snapshot();
    assert!(matches!(snap.state, LoadState::Error(ref msg) if msg.contains("503")));
    assert_eq!(snap.fleet.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timer_keeps_running_in_error_and_recovers_silently() {
    let mut dash = controller(FakeSource::new(
        Reply::Ok(vec![raw_truck("T-1")]),
        Reply::Ok(Vec::new()),
    ));
    let mut rx = dash.subscribe();
    dash.start(Duration::from_secs(30));
    rx.wait_for(|s| s.state == LoadState::Ready).await.unwrap();

    *dash.source.enhanced.lock().unwrap() = Reply::Fail;
    *dash.source.fallback.lock().unwrap() = Reply::Fail;
    rx.wait_for(|s| matches!(s.state, LoadState::Error(_)))
        .await
        .unwrap();
    assert_eq!(rx.borrow().fleet.len(), 1);
    let failed_calls = dash.source.enhanced_calls.load(Ordering::SeqCst);
    assert!(failed_calls >= 2);

    *dash.source.enhanced.lock().unwrap() = Reply::Ok(vec![raw_truck("T-1"), raw_truck("T-2")]);
    let recovered = rx
        .wait_for(|s| {
            assert_ne!(s.state, LoadState::Loading, "recovery must not show the loading state");
            s.state == LoadState::Ready
        })
        .await
        .unwrap()
        .clone();
    assert_eq!(recovered.fleet.len(), 2);
    assert_eq!(recovered.source, DataSource::Primary);
    assert!(dash.source.enhanced_calls.load(Ordering::SeqCst) > failed_calls);

    dash.shutdown().await;
}

#[tokio::test]
async fn overlapping_refreshes_last_resolved_wins() {
    let (early_tx, early_rx) = oneshot::channel();
    let (late_tx, late_rx) = oneshot::channel();
    let source = ScriptedSource {
        pending: Mutex::new(VecDeque::from([early_rx, late_rx])),
    };
    let dash = DashboardController::new(source, business(), MapAvailability::Ready);
    let mut rx = dash.subscribe();

    let resolve = async {
        late_tx
            .send(Ok(vec![raw_truck("B-1"), raw_truck("B-2")]))
            .unwrap();
        rx.wait_for(|s| s.fleet.len() == 2).await.unwrap();
        early_tx.send(Ok(vec![raw_truck("A-1")])).unwrap();
    };
    tokio::join!(dash.refresh_now(), dash.refresh_now(), resolve);

    let snap = dash.snapshot();
    assert_eq!(snap.state, LoadState::Ready);
    assert_eq!(snap.fleet.len(), 1);
    assert_eq!(snap.fleet[0].vehicle_id, "A-1");
}

#[tokio::test]
async fn live_alerts_merge_into_vehicle_tags_and_filters() {
    let dash = controller(FakeSource::new(
        Reply::Ok(vec![raw_truck("T-1"), raw_truck("T-2")]),
        Reply::Ok(Vec::new()),
    ));
    dash.refresh_now().await;
    dash.apply_alerts(vec![alert("a1", "Delay", "T-2")]);

    let snap = dash.snapshot();
    let merged = snap.vehicles();
    assert!(merged.iter().find(|v| v.vehicle_id == "T-2").unwrap().has_alert("delay"));
    assert!(merged.iter().find(|v| v.vehicle_id == "T-1").unwrap().alerts.is_empty());

    dash.set_filter(VehicleFilter::WithAlerts);
    let visible = dash.snapshot().visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].vehicle_id, "T-2");
}

#[tokio::test]
async fn search_narrows_visible_vehicles() {
    let dash = controller(FakeSource::new(
        Reply::Ok(vec![raw_truck("T-1"), raw_truck("X-9")]),
        Reply::Ok(Vec::new()),
    ));
    dash.refresh_now().await;
    dash.set_search("x-9");

    let visible = dash.snapshot().visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].vehicle_id, "X-9");
}

#[tokio::test]
async fn timer_refreshes_immediately_and_on_request() {
    let mut dash = controller(FakeSource::new(
        Reply::Ok(vec![raw_truck("T-1")]),
        Reply::Ok(Vec::new()),
    ));
    let mut rx = dash.subscribe();
    dash.start(Duration::from_secs(3600));

    rx.wait_for(|s| s.state == LoadState::Ready).await.unwrap();
    assert_eq!(dash.source.enhanced_calls.load(Ordering::SeqCst), 1);

    assert!(dash.request_refresh());
    rx.changed().await.unwrap();
    assert_eq!(dash.source.enhanced_calls.load(Ordering::SeqCst), 2);

    dash.shutdown().await;
    assert!(!dash.request_refresh());
}

#[tokio::test]
async fn refresh_finishing_after_teardown_is_discarded() {
    let gate = Arc::new(Notify::new());
    let mut source = FakeSource::new(Reply::Ok(vec![raw_truck("T-1")]), Reply::Ok(Vec::new()));
    source.gate = Some(Arc::clone(&gate));
    let entered = Arc::clone(&source.entered);

    let mut dash = controller(source);
    let rx = dash.subscribe();
    dash.start(Duration::from_secs(3600));

    entered.notified().await;
    dash.shutdown().await;
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snap = rx.borrow();
    assert!(snap.is_initial_load());
    assert!(snap.fleet.is_empty());
}

#[tokio::test]
async fn alert_sink_stops_after_teardown() {
    let mut dash = controller(FakeSource::new(Reply::Ok(Vec::new()), Reply::Ok(Vec::new())));
    let mut sink = dash.alert_sink();
    sink(vec![alert("a1", "delay", "T-1")]);
    assert_eq!(dash.snapshot().alerts.len(), 1);

    dash.shutdown().await;
    sink(Vec::new());
    assert_eq!(dash.snapshot().alerts.len(), 1);
}

#[test]
fn filters_and_view_modes_parse() {
    assert_eq!("map".parse::<ViewMode>(), Ok(ViewMode::Map));
    assert_eq!(
        "in_transit".parse::<VehicleFilter>(),
        Ok(VehicleFilter::Status(VehicleStatus::InTransit))
    );
    assert_eq!("with_alerts".parse::<VehicleFilter>(), Ok(VehicleFilter::WithAlerts));
    assert!("parked".parse::<VehicleFilter>().is_err());
}

#[test]
fn missing_maps_key_blocks_map_view() {
    assert!(matches!(
        MapAvailability::KeyRequired.ensure_ready(),
        Err(FleetError::MapsKeyRequired)
    ));
    assert!(MapAvailability::Ready.ensure_ready().is_ok());
}
