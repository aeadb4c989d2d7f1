//! Driver-side tracking session.
//!
//! Two independent tasks: a position watch that stores the most recent
//! sample, and a timer that pushes whatever sample is latest at each tick.
//! A fast device does not cause extra pushes and a silent one causes
//! repeated pushes of the last known fix. Nothing is sent before the first
//! fix arrives.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fleetdash_api::{ActionAck, ApiError, FleetApiClient};
use fleetdash_core::PositionSample;
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Receives position pushes for a session.
pub trait LocationSink: Send + Sync + 'static {
    fn push(
        &self,
        session_id: &str,
        sample: &PositionSample,
    ) -> impl Future<Output = Result<ActionAck, ApiError>> + Send;
}

impl LocationSink for FleetApiClient {
    fn push(
        &self,
        session_id: &str,
        sample: &PositionSample,
    ) -> impl Future<Output = Result<ActionAck, ApiError>> + Send {
        self.push_location(session_id, sample)
    }
}

/// Why the push loop ended on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEnd {
    /// The session id is unknown to the backend.
    SessionNotFound,
    SessionExpired,
}

pub struct LocationTracker {
    session_id: String,
    latest: Arc<watch::Sender<Option<PositionSample>>>,
    pusher: Option<JoinHandle<TrackingEnd>>,
    watcher: Option<JoinHandle<()>>,
}

impl LocationTracker {
    /// Starts the push timer for `session_id`. The first tick fires
    /// immediately but is a no-op until a sample is recorded.
    pub fn start<K: LocationSink>(
        sink: Arc<K>,
        session_id: impl Into<String>,
        period: Duration,
    ) -> Self {
        let session_id = session_id.into();
        let (tx, _) = watch::channel(None);
        let latest = Arc::new(tx);

        let pusher = tokio::spawn(push_loop(
            sink,
            session_id.clone(),
            Arc::clone(&latest),
            period,
        ));
        tracing::info!(
            session_id,
            period_secs = period.as_secs(),
            "location tracking started"
        );

        Self {
            session_id,
            latest,
            pusher: Some(pusher),
            watcher: None,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Stores a fix as the latest known position.
    pub fn record(&self, sample: PositionSample) {
        self.latest.send_replace(Some(sample));
    }

    /// Follows a continuous position source. Replaces any earlier watch.
    pub fn watch_positions<St>(&mut self, positions: St)
    where
        St: Stream<Item = PositionSample> + Send + 'static,
    {
        if let Some(old) = self.watcher.take() {
            old.abort();
        }
        let latest = Arc::clone(&self.latest);
        self.watcher = Some(tokio::spawn(async move {
            let mut positions = std::pin::pin!(positions);
            while let Some(sample) = positions.next().await {
                tracing::trace!(
                    lat = sample.latitude,
                    lng = sample.longitude,
                    "position sample"
                );
                latest.send_replace(Some(sample));
            }
            tracing::debug!("position source ended");
        }));
    }

    #[must_use]
    pub fn latest(&self) -> Option<PositionSample> {
        self.latest.borrow().clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pusher.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Waits for the push loop to end on its own. Returns `None` if it was
    /// stopped or already awaited.
    pub async fn wait(&mut self) -> Option<TrackingEnd> {
        let pusher = self.pusher.as_mut()?;
        let end = pusher.await.ok();
        self.pusher = None;
        end
    }

    /// Clears the position watch and the push timer.
    pub fn stop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        if let Some(pusher) = self.pusher.take() {
            pusher.abort();
            tracing::info!(session_id = %self.session_id, "location tracking stopped");
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn push_loop<K: LocationSink>(
    sink: Arc<K>,
    session_id: String,
    latest: Arc<watch::Sender<Option<PositionSample>>>,
    period: Duration,
) -> TrackingEnd {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(sample) = latest.borrow().clone() else {
            tracing::trace!(session_id, "no position yet, skipping push");
            continue;
        };
        match sink.push(&session_id, &sample).await {
            Ok(ack) if ack.success => tracing::debug!(session_id, "location pushed"),
            Ok(ack) => tracing::warn!(
                session_id,
                message = ack.message.as_deref().unwrap_or_default(),
                "location push refused"
            ),
            Err(ApiError::NotFound { .. }) => {
                tracing::warn!(session_id, "tracking session not found, stopping");
                return TrackingEnd::SessionNotFound;
            }
            Err(ApiError::Expired { .. }) => {
                tracing::warn!(session_id, "tracking session expired, stopping");
                return TrackingEnd::SessionExpired;
            }
            Err(e) => tracing::warn!(session_id, error = %e, "location push failed"),
        }
    }
}
