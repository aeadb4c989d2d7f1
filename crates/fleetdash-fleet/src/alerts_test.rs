use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use fleetdash_core::TenantType;
use serde_json::json;

use super::*;

#[derive(Default)]
struct FakeChannel {
    tx: Mutex<Option<mpsc::Sender<Vec<Alert>>>>,
}

impl AlertChannel for FakeChannel {
    fn open(&self, _tenant: &Tenant) -> mpsc::Receiver<Vec<Alert>> {
        let (tx, rx) = mpsc::channel(8);
        *self.tx.lock().unwrap() = Some(tx);
        rx
    }
}

impl FakeChannel {
    fn sender(&self) -> mpsc::Sender<Vec<Alert>> {
        self.tx.lock().unwrap().clone().expect("channel not opened")
    }
}

#[derive(Default)]
struct FakeActions {
    reject: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeActions {
    fn ack(&self, call: String) -> ActionAck {
        self.calls.lock().unwrap().push(call);
        ActionAck {
            success: !self.reject,
            message: self.reject.then(|| "already resolved".to_string()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl AlertActions for FakeActions {
    async fn acknowledge(&self, alert_id: &str, actor: &str) -> Result<ActionAck, ApiError> {
        Ok(self.ack(format!("ack {alert_id} by {actor}")))
    }

    async fn resolve(&self, alert_id: &str, actor: &str, note: &str) -> Result<ActionAck, ApiError> {
        Ok(self.ack(format!("resolve {alert_id} by {actor}: {note}")))
    }

    async fn statistics(&self, _tenant: &Tenant) -> Result<AlertStatistics, ApiError> {
        Ok(AlertStatistics {
            active: 1,
            ..AlertStatistics::default()
        })
    }
}

fn adapter() -> AlertStreamAdapter<FakeChannel, FakeActions> {
    AlertStreamAdapter::new(FakeChannel::default(), FakeActions::default())
}

fn tenant() -> Tenant {
    Tenant::new(Some("biz-1".into()), TenantType::Business)
}

fn alert(id: &str, kind: &str, status: &str) -> Alert {
    serde_json::from_value(json!({
        "id": id,
        "type": kind,
        "severity": "high",
        "vehicleId": "T-1",
        "message": "Driver pressed SOS",
        "status": status
    }))
    .unwrap()
}

fn never_asked(_: &str) -> bool {
    panic!("confirmation should not be requested")
}

#[tokio::test]
async fn snapshots_are_filtered_to_active() {
    let adapter = adapter();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let _sub = adapter.subscribe(&tenant(), move |alerts| {
        let _ = out_tx.send(alerts);
    });

    adapter
        .channel
        .sender()
        .send(vec![alert("1", "delay", "active"), alert("2", "delay", "resolved")])
        .await
        .unwrap();

    let delivered = out_rx.recv().await.unwrap();
    let ids: Vec<&str> = delivered.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1"]);
}

#[tokio::test]
async fn every_snapshot_is_delivered_in_full() {
    let adapter = adapter();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let _sub = adapter.subscribe(&tenant(), move |alerts| {
        let _ = out_tx.send(alerts);
    });
    let tx = adapter.channel.sender();

    tx.send(vec![alert("1", "delay", "active")]).await.unwrap();
    tx.send(vec![alert("1", "delay", "active"), alert("3", "sos", "active")])
        .await
        .unwrap();
    tx.send(Vec::new()).await.unwrap();

    assert_eq!(out_rx.recv().await.unwrap().len(), 1);
    assert_eq!(out_rx.recv().await.unwrap().len(), 2);
    assert!(out_rx.recv().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsubscribe_closes_the_transport() {
    let adapter = adapter();
    let sub = adapter.subscribe(&tenant(), |_| {});
    let tx = adapter.channel.sender();
    assert!(sub.is_active());

    sub.unsubscribe().await;
    assert!(tx.is_closed());
}

#[tokio::test]
async fn dropping_the_handle_cancels_delivery() {
    let adapter = adapter();
    let sub = adapter.subscribe(&tenant(), |_| {});
    let tx = adapter.channel.sender();

    drop(sub);
    tokio::time::timeout(Duration::from_secs(1), tx.closed())
        .await
        .expect("transport should close after the handle is dropped");
}

#[tokio::test]
async fn emergency_resolve_with_blank_note_makes_no_call() {
    let adapter = adapter();
    let result = adapter
        .resolve(&alert("9", "sos", "active"), "dispatcher", "   ", &never_asked)
        .await;

    assert!(matches!(result, Err(FleetError::Validation(_))));
    assert_eq!(adapter.actions().call_count(), 0);
}

#[tokio::test]
async fn declined_emergency_confirmation_cancels() {
    let adapter = adapter();
    let outcome = adapter
        .resolve(&alert("9", "Emergency", "active"), "dispatcher", "tow sent", &|_: &str| false)
        .await
        .unwrap();

    assert_eq!(outcome, ActionOutcome::Cancelled);
    assert_eq!(adapter.actions().call_count(), 0);
}

#[tokio::test]
async fn emergency_acknowledge_asks_first() {
    let adapter = adapter();
    let asked = AtomicUsize::new(0);
    let confirm = |prompt: &str| {
        assert!(prompt.contains("EMERGENCY"));
        asked.fetch_add(1, Ordering::SeqCst);
        true
    };

    let outcome = adapter
        .acknowledge(&alert("9", "sos", "active"), "dispatcher", &confirm)
        .await
        .unwrap();

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(asked.load(Ordering::SeqCst), 1);
    assert_eq!(
        adapter.actions().calls.lock().unwrap().as_slice(),
        ["ack 9 by dispatcher"]
    );
}

#[tokio::test]
async fn routine_alerts_skip_confirmation_and_note_check() {
    let adapter = adapter();
    adapter
        .acknowledge(&alert("4", "delay", "active"), "ops", &never_asked)
        .await
        .unwrap();
    let outcome = adapter
        .resolve(&alert("4", "delay", "active"), "ops", "", &never_asked)
        .await
        .unwrap();

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(adapter.actions().call_count(), 2);
}

#[tokio::test]
async fn backend_refusal_is_reported_not_raised() {
    let adapter = AlertStreamAdapter::new(
        FakeChannel::default(),
        FakeActions {
            reject: true,
            ..FakeActions::default()
        },
    );
    let outcome = adapter
        .acknowledge(&alert("4", "delay", "active"), "ops", &never_asked)
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Rejected("already resolved".into()));
}

#[tokio::test]
async fn one_shot_snapshot_is_filtered() {
    let adapter = adapter();
    let tenant = tenant();
    let pending = adapter.snapshot(&tenant, Duration::from_secs(5));
    let push = async {
        // The channel is opened on first poll of `pending`.
        tokio::task::yield_now().await;
        adapter
            .channel
            .sender()
            .send(vec![alert("1", "sos", "active"), alert("2", "sos", "acknowledged")])
            .await
            .unwrap();
    };
    let (alerts, ()) = tokio::join!(pending, push);
    assert_eq!(alerts.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn one_shot_snapshot_times_out() {
    let result = adapter().snapshot(&tenant(), Duration::from_secs(5)).await;
    assert!(matches!(result, Err(FleetError::Channel(_))));
}

#[tokio::test]
async fn statistics_pass_through() {
    let stats = adapter().statistics(&tenant()).await.unwrap();
    assert_eq!(stats.active, 1);
}
