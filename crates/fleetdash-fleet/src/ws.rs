//! Websocket alert push channel.
//!
//! After connecting, the client sends one subscribe frame for the tenant and
//! then receives `{"event":"alerts","alerts":[...]}` snapshots. Lost
//! connections are re-established with capped exponential backoff.

use std::time::Duration;

use fleetdash_core::{Alert, AppConfig, Tenant, TenantType};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::alerts::AlertChannel;

/// Reconnection attempts before the channel gives up.
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

const RECONNECT_BASE_DELAY_SECS: u64 = 2;

const MAX_RECONNECT_DELAY_SECS: u64 = 60;

const SNAPSHOT_BUFFER: usize = 16;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeFrame<'a> {
    event: &'static str,
    tenant_id: Option<&'a str>,
    tenant_type: TenantType,
}

#[derive(Debug, Deserialize)]
struct EventFrame {
    event: String,
    #[serde(default)]
    alerts: Vec<Value>,
}

/// How one connection ended.
enum SessionEnd {
    /// The receiving side is gone; stop for good.
    SubscriberGone,
    Dropped { connected: bool, reason: String },
}

#[derive(Debug, Clone)]
pub struct WsAlertChannel {
    url: String,
}

impl WsAlertChannel {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ws_url.clone())
    }
}

impl AlertChannel for WsAlertChannel {
    fn open(&self, tenant: &Tenant) -> mpsc::Receiver<Vec<Alert>> {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        tokio::spawn(connection_loop(self.url.clone(), tenant.clone(), tx));
        rx
    }
}

async fn connection_loop(url: String, tenant: Tenant, tx: mpsc::Sender<Vec<Alert>>) {
    let mut attempts = 0u32;
    loop {
        match run_connection(&url, &tenant, &tx).await {
            SessionEnd::SubscriberGone => {
                tracing::debug!(url, "alert subscriber gone, closing channel");
                return;
            }
            SessionEnd::Dropped { connected, reason } => {
                if connected {
                    attempts = 0;
                }
                attempts += 1;
                if attempts >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        url,
                        attempts,
                        reason,
                        "alert channel reconnection failed, giving up"
                    );
                    return;
                }
                let delay_secs = backoff_delay_secs(attempts);
                tracing::warn!(url, attempts, delay_secs, reason, "alert channel dropped, reconnecting");
                tokio::select! {
                    () = tokio::time::sleep(Duration::from_secs(delay_secs)) => {}
                    () = tx.closed() => return,
                }
            }
        }
    }
}

fn backoff_delay_secs(attempts: u32) -> u64 {
    RECONNECT_BASE_DELAY_SECS
        .saturating_mul(1 << attempts.saturating_sub(1).min(6))
        .min(MAX_RECONNECT_DELAY_SECS)
}

async fn run_connection(url: &str, tenant: &Tenant, tx: &mpsc::Sender<Vec<Alert>>) -> SessionEnd {
    let (stream, _) = match connect_async(url).await {
        Ok(ok) => ok,
        Err(e) => {
            return SessionEnd::Dropped {
                connected: false,
                reason: e.to_string(),
            }
        }
    };
    tracing::info!(url, tenant_type = %tenant.tenant_type, "alert channel connected");
    let (mut write, mut read) = stream.split();

    let frame = SubscribeFrame {
        event: "subscribe",
        tenant_id: tenant.id.as_deref(),
        tenant_type: tenant.tenant_type,
    };
    let subscribe = match serde_json::to_string(&frame) {
        Ok(text) => text,
        Err(e) => {
            return SessionEnd::Dropped {
                connected: true,
                reason: e.to_string(),
            }
        }
    };
    if let Err(e) = write.send(Message::Text(subscribe.into())).await {
        return SessionEnd::Dropped {
            connected: true,
            reason: e.to_string(),
        };
    }

    loop {
        tokio::select! {
            () = tx.closed() => {
                let _ = write.send(Message::Close(None)).await;
                return SessionEnd::SubscriberGone;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Some(alerts) = parse_snapshot(text.as_str()) {
                        if tx.send(alerts).await.is_err() {
                            return SessionEnd::SubscriberGone;
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Dropped {
                        connected: true,
                        reason: "closed by server".to_string(),
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return SessionEnd::Dropped {
                        connected: true,
                        reason: e.to_string(),
                    };
                }
            },
        }
    }
}

/// Decodes an `alerts` event. Other events and malformed frames yield
/// `None`; malformed entries inside a snapshot are skipped.
fn parse_snapshot(text: &str) -> Option<Vec<Alert>> {
    let frame: EventFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed alert frame");
            return None;
        }
    };
    if frame.event != "alerts" {
        return None;
    }
    let total = frame.alerts.len();
    let alerts: Vec<Alert> = frame
        .alerts
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if alerts.len() < total {
        tracing::warn!(skipped = total - alerts.len(), "skipping malformed alerts");
    }
    Some(alerts)
}
