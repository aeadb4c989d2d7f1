//! `tracking` command handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use fleetdash_api::{ApiError, FleetApiClient};
use fleetdash_core::{AppConfig, Coordinates, PositionSample, TrackingLinkRequest};
use fleetdash_fleet::{LocationTracker, TrackingEnd};
use futures::Stream;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Subcommand)]
pub enum TrackingCommands {
    /// Text a tracking link to a driver
    SendLink {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        vehicle: String,
        #[arg(long)]
        driver: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// List active tracking sessions
    Sessions,
    /// Show one tracking session
    Info { session_id: String },
    /// Re-send the tracking link for a session
    Resend { session_id: String },
    /// Push positions read from stdin as `lat,lng[,accuracy]` lines
    Run {
        session_id: String,
        /// Seconds between pushes; defaults to the configured interval
        #[arg(long)]
        interval: Option<u64>,
    },
}

/// # Errors
///
/// Returns an error if the client cannot be built or a backend call fails.
pub(crate) async fn run_tracking(
    config: &AppConfig,
    command: TrackingCommands,
) -> anyhow::Result<()> {
    let client = FleetApiClient::from_config(config)?;
    match command {
        TrackingCommands::SendLink {
            phone,
            vehicle,
            driver,
            message,
        } => {
            let response = client
                .send_tracking_link(&TrackingLinkRequest {
                    phone,
                    vehicle_id: vehicle,
                    driver_name: driver,
                    custom_message: message,
                })
                .await?;
            if response.simulated {
                println!("tracking link simulated (no SMS provider configured)");
            } else {
                println!("tracking link sent");
            }
            if let Some(url) = response.tracking_url {
                println!("{url}");
            }
        }
        TrackingCommands::Sessions => {
            let sessions = client.active_sessions().await?;
            if sessions.is_empty() {
                println!("no active tracking sessions");
                return Ok(());
            }
            println!("{:<26}{:<12}{:<18}{:<10}EXPIRES", "SESSION", "VEHICLE", "DRIVER", "STATUS");
            for s in &sessions {
                println!(
                    "{:<26}{:<12}{:<18}{:<10}{}",
                    s.session_id,
                    s.vehicle_id.as_deref().unwrap_or("-"),
                    s.driver_name.as_deref().unwrap_or("-"),
                    format!("{:?}", s.status).to_lowercase(),
                    s.expires_at
                        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
                );
            }
        }
        TrackingCommands::Info { session_id } => match client.session_info(&session_id).await {
            Ok(session) => println!("{}", serde_json::to_string_pretty(&session)?),
            Err(ApiError::NotFound { .. }) => anyhow::bail!("tracking session '{session_id}' not found"),
            Err(ApiError::Expired { .. }) => anyhow::bail!("tracking session '{session_id}' has expired"),
            Err(e) => return Err(e.into()),
        },
        TrackingCommands::Resend { session_id } => {
            let response = client.resend_link(&session_id).await?;
            println!(
                "{}",
                response.message.as_deref().unwrap_or("tracking link re-sent")
            );
        }
        TrackingCommands::Run {
            session_id,
            interval,
        } => {
            let period = Duration::from_secs(interval.unwrap_or(config.tracking_push_interval_secs).max(1));
            run_session(client, session_id, period).await?;
        }
    }
    Ok(())
}

async fn run_session(
    client: FleetApiClient,
    session_id: String,
    period: Duration,
) -> anyhow::Result<()> {
    let client = Arc::new(client);
    let started = client.start_session(&session_id).await?;
    if !started.success {
        anyhow::bail!(
            "session could not be started: {}",
            started.message.unwrap_or_default()
        );
    }

    let mut tracker = LocationTracker::start(Arc::clone(&client), session_id, period);
    tracker.watch_positions(stdin_positions());
    println!(
        "tracking {}; reading positions from stdin, ctrl-c to stop",
        tracker.session_id()
    );

    let end = tokio::select! {
        () = crate::shutdown_signal() => None,
        end = tracker.wait() => end,
    };
    tracker.stop();
    let session_id = tracker.session_id();

    match end {
        Some(TrackingEnd::SessionNotFound) => anyhow::bail!("tracking session '{session_id}' not found"),
        Some(TrackingEnd::SessionExpired) => anyhow::bail!("tracking session '{session_id}' has expired"),
        None => {
            let ack = client.end_session(session_id).await?;
            if ack.success {
                println!("session ended");
            } else {
                println!("session end refused: {}", ack.message.unwrap_or_default());
            }
        }
    }
    Ok(())
}

/// Position samples parsed from stdin. Unparseable lines are skipped.
fn stdin_positions() -> impl Stream<Item = PositionSample> + Send + 'static {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    futures::stream::unfold(lines, |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(sample) = parse_position_line(&line) {
                        return Some((sample, lines));
                    }
                    tracing::warn!(line, "skipping unparseable position");
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read position from stdin");
                    return None;
                }
            }
        }
    })
}

/// Parses `lat,lng[,accuracy]`.
pub(crate) fn parse_position_line(line: &str) -> Option<PositionSample> {
    let mut parts = line.split(',').map(str::trim);
    let lat = parts.next()?.parse::<f64>().ok()?;
    let lng = parts.next()?.parse::<f64>().ok()?;
    let accuracy = match parts.next() {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<f64>().ok()?),
        _ => None,
    };
    if parts.next().is_some() {
        return None;
    }
    let at = Coordinates::new(lat, lng)?;
    if !(-90.0..=90.0).contains(&at.lat) || !(-180.0..=180.0).contains(&at.lng) {
        return None;
    }
    Some(PositionSample::new(at, accuracy, Utc::now()))
}
