mod alerts;
mod fleet;
mod surface;
mod tracking;

use clap::{Parser, Subcommand};
use fleetdash_fleet::{VehicleFilter, ViewMode};
use tracing_subscriber::EnvFilter;

use crate::alerts::AlertsCommands;
use crate::tracking::TrackingCommands;

#[derive(Debug, Parser)]
#[command(name = "fleetdash-cli")]
#[command(about = "Fleet dashboard command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh once and print the canonical vehicle list
    Vehicles {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run the live dashboard until interrupted
    Watch {
        /// `list` or `map`
        #[arg(long, default_value = "list")]
        view: ViewMode,
        /// `all`, `with_alerts`, or a vehicle status such as `in_transit`
        #[arg(long, default_value = "all")]
        filter: VehicleFilter,
        /// Free-text search over id, driver, plate and address
        #[arg(long)]
        search: Option<String>,
        /// Skip route lines on the map view
        #[arg(long)]
        no_routes: bool,
    },
    /// Acknowledge or resolve alerts
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },
    /// Driver tracking sessions
    Tracking {
        #[command(subcommand)]
        command: TrackingCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = fleetdash_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Vehicles { json } => fleet::run_vehicles(&config, json).await?,
        Commands::Watch {
            view,
            filter,
            search,
            no_routes,
        } => {
            let options = fleet::WatchOptions {
                view,
                filter,
                search: search.unwrap_or_default(),
                show_routes: !no_routes,
            };
            fleet::run_watch(&config, options).await?;
        }
        Commands::Alerts { command } => alerts::run_alerts(&config, command).await?,
        Commands::Tracking { command } => tracking::run_tracking(&config, command).await?,
    }

    Ok(())
}

/// Resolves on ctrl-c or, on unix, SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal");
}
