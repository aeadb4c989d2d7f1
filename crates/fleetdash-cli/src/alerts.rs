//! `alerts` command handlers.
//!
//! The backend has no alert-by-id lookup, so the target alert is taken from
//! the first snapshot pushed on the alert channel.

use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Subcommand;
use fleetdash_api::FleetApiClient;
use fleetdash_core::AppConfig;
use fleetdash_fleet::{ActionOutcome, AlertStreamAdapter, FleetError, WsAlertChannel};

use crate::fleet::tenant_from_config;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Subcommand)]
pub enum AlertsCommands {
    /// Acknowledge an active alert
    Ack {
        alert_id: String,
        /// Name recorded as the acknowledging operator
        #[arg(long, default_value = "dispatcher")]
        actor: String,
    },
    /// Resolve an active alert
    Resolve {
        alert_id: String,
        /// Resolution note; required for emergency alerts
        #[arg(long, default_value = "")]
        note: String,
        #[arg(long, default_value = "dispatcher")]
        actor: String,
    },
}

/// # Errors
///
/// Returns an error if the alert is not among the active alerts, the note
/// is missing for an emergency resolve, or the backend call fails.
pub(crate) async fn run_alerts(config: &AppConfig, command: AlertsCommands) -> anyhow::Result<()> {
    let client = FleetApiClient::from_config(config)?;
    let tenant = tenant_from_config(config);
    let adapter = AlertStreamAdapter::new(WsAlertChannel::from_config(config), client);

    let alert_id = match &command {
        AlertsCommands::Ack { alert_id, .. } | AlertsCommands::Resolve { alert_id, .. } => {
            alert_id.clone()
        }
    };
    let alert = adapter
        .snapshot(&tenant, SNAPSHOT_TIMEOUT)
        .await?
        .into_iter()
        .find(|a| a.id == alert_id)
        .ok_or_else(|| anyhow::anyhow!("alert '{alert_id}' is not active"))?;

    let outcome = match command {
        AlertsCommands::Ack { actor, .. } => adapter.acknowledge(&alert, &actor, &prompt_yes_no).await,
        AlertsCommands::Resolve { actor, note, .. } => {
            adapter.resolve(&alert, &actor, &note, &prompt_yes_no).await
        }
    };

    match outcome {
        Ok(ActionOutcome::Completed) => {
            println!("alert {alert_id} updated");
            let stats = adapter.statistics(&tenant).await?;
            println!(
                "active {}  acknowledged {}  resolved {}  critical {}",
                stats.active, stats.acknowledged, stats.resolved, stats.critical
            );
        }
        Ok(ActionOutcome::Rejected(reason)) => println!("alert {alert_id} not updated: {reason}"),
        Ok(ActionOutcome::Cancelled) => println!("cancelled"),
        Err(FleetError::Validation(reason)) => anyhow::bail!(reason),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn prompt_yes_no(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
