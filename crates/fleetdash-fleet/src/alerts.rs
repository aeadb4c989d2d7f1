//! Alert subscription and lifecycle actions.
//!
//! Every pushed snapshot is filtered to active alerts and handed to the
//! subscriber in full. Acknowledge and resolve are pure external calls; the
//! local list only changes when the next snapshot arrives.

use std::future::Future;
use std::time::Duration;

use fleetdash_api::{ActionAck, ApiError, FleetApiClient};
use fleetdash_core::{Alert, AlertStatistics, Tenant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::FleetError;

/// Transport that delivers raw alert snapshots for a tenant.
pub trait AlertChannel: Send + Sync {
    /// Opens the channel. Snapshots arrive on the returned receiver until
    /// the transport gives up; dropping the receiver closes the transport.
    fn open(&self, tenant: &Tenant) -> mpsc::Receiver<Vec<Alert>>;
}

/// Backend calls behind the alert lifecycle buttons.
pub trait AlertActions: Send + Sync {
    fn acknowledge(
        &self,
        alert_id: &str,
        actor: &str,
    ) -> impl Future<Output = Result<ActionAck, ApiError>> + Send;

    fn resolve(
        &self,
        alert_id: &str,
        actor: &str,
        note: &str,
    ) -> impl Future<Output = Result<ActionAck, ApiError>> + Send;

    fn statistics(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<AlertStatistics, ApiError>> + Send;
}

impl AlertActions for FleetApiClient {
    fn acknowledge(
        &self,
        alert_id: &str,
        actor: &str,
    ) -> impl Future<Output = Result<ActionAck, ApiError>> + Send {
        self.acknowledge_alert(alert_id, actor)
    }

    fn resolve(
        &self,
        alert_id: &str,
        actor: &str,
        note: &str,
    ) -> impl Future<Output = Result<ActionAck, ApiError>> + Send {
        self.resolve_alert(alert_id, actor, note)
    }

    fn statistics(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<AlertStatistics, ApiError>> + Send {
        self.alert_statistics(tenant)
    }
}

/// Asks the operator to confirm a destructive action.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirmer for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The backend answered but refused the action.
    Rejected(String),
    /// The operator declined the confirmation; nothing was sent.
    Cancelled,
}

impl From<ActionAck> for ActionOutcome {
    fn from(ack: ActionAck) -> Self {
        if ack.success {
            ActionOutcome::Completed
        } else {
            ActionOutcome::Rejected(
                ack.message
                    .unwrap_or_else(|| "action was not applied".to_string()),
            )
        }
    }
}

/// Live subscription handle. Unsubscribe on teardown; dropping the handle
/// also stops the forwarding task.
pub struct AlertSubscription {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl AlertSubscription {
    /// Stops delivery and waits for the forwarding task to finish.
    pub async fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for AlertSubscription {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

pub struct AlertStreamAdapter<C, A> {
    channel: C,
    actions: A,
}

impl<C: AlertChannel, A: AlertActions> AlertStreamAdapter<C, A> {
    pub fn new(channel: C, actions: A) -> Self {
        Self { channel, actions }
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Subscribes to `tenant`'s alerts. `on_update` receives every snapshot
    /// filtered to active alerts.
    pub fn subscribe<F>(&self, tenant: &Tenant, mut on_update: F) -> AlertSubscription
    where
        F: FnMut(Vec<Alert>) + Send + 'static,
    {
        let mut snapshots = self.channel.open(tenant);
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let tenant_type = tenant.tenant_type;

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    snapshot = snapshots.recv() => match snapshot {
                        Some(alerts) => {
                            let active = active_only(alerts);
                            tracing::debug!(%tenant_type, active = active.len(), "alert snapshot");
                            on_update(active);
                        }
                        None => {
                            tracing::warn!(%tenant_type, "alert channel closed");
                            break;
                        }
                    },
                }
            }
        });

        AlertSubscription {
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }

    /// Waits for one pushed snapshot and returns its active alerts.
    ///
    /// # Errors
    ///
    /// [`FleetError::Channel`] if nothing arrives within `wait` or the
    /// channel closes first.
    pub async fn snapshot(&self, tenant: &Tenant, wait: Duration) -> Result<Vec<Alert>, FleetError> {
        let mut snapshots = self.channel.open(tenant);
        match tokio::time::timeout(wait, snapshots.recv()).await {
            Ok(Some(alerts)) => Ok(active_only(alerts)),
            Ok(None) => Err(FleetError::Channel(
                "alert channel closed before sending alerts".to_string(),
            )),
            Err(_) => Err(FleetError::Channel(format!(
                "no alert snapshot within {}s",
                wait.as_secs()
            ))),
        }
    }

    /// Acknowledges an alert. Emergency-class alerts need confirmation.
    ///
    /// # Errors
    ///
    /// [`FleetError::Api`] when the backend call fails.
    pub async fn acknowledge<K: Confirmer + ?Sized>(
        &self,
        alert: &Alert,
        actor: &str,
        confirmer: &K,
    ) -> Result<ActionOutcome, FleetError> {
        if alert.is_emergency()
            && !confirmer.confirm(&format!(
                "Acknowledge EMERGENCY alert {} ({})?",
                alert.id, alert.message
            ))
        {
            return Ok(ActionOutcome::Cancelled);
        }
        let ack = self.actions.acknowledge(&alert.id, actor).await?;
        tracing::info!(alert_id = %alert.id, success = ack.success, "alert acknowledged");
        Ok(ack.into())
    }

    /// Resolves an alert. Emergency-class alerts need a non-blank note and
    /// a confirmation.
    ///
    /// # Errors
    ///
    /// - [`FleetError::Validation`] for an emergency alert with a blank
    ///   note; no call is made.
    /// - [`FleetError::Api`] when the backend call fails.
    pub async fn resolve<K: Confirmer + ?Sized>(
        &self,
        alert: &Alert,
        actor: &str,
        note: &str,
        confirmer: &K,
    ) -> Result<ActionOutcome, FleetError> {
        if alert.is_emergency() {
            if note.trim().is_empty() {
                return Err(FleetError::Validation(
                    "a resolution note is required for emergency alerts".to_string(),
                ));
            }
            if !confirmer.confirm(&format!(
                "Resolve EMERGENCY alert {} ({})?",
                alert.id, alert.message
            )) {
                return Ok(ActionOutcome::Cancelled);
            }
        }
        let ack = self.actions.resolve(&alert.id, actor, note.trim()).await?;
        tracing::info!(alert_id = %alert.id, success = ack.success, "alert resolved");
        Ok(ack.into())
    }

    /// Fetches the counters panel, typically after an action.
    ///
    /// # Errors
    ///
    /// [`FleetError::Api`] when the backend call fails.
    pub async fn statistics(&self, tenant: &Tenant) -> Result<AlertStatistics, FleetError> {
        Ok(self.actions.statistics(tenant).await?)
    }
}

#[must_use]
pub fn active_only(alerts: Vec<Alert>) -> Vec<Alert> {
    alerts.into_iter().filter(Alert::is_active).collect()
}

#[cfg(test)]
#[path = "alerts_test.rs"]
mod tests;
