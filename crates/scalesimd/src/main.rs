//! scalesimd — the scalesim dashboard daemon.
//!
//! Loads `scalesim.toml`, connects to the remote simulator, and either
//! serves the dashboard or performs a single run and prints the datasets.
//!
//! # Usage
//!
//! ```text
//! scalesimd --config scalesim.toml serve --port 8080
//! scalesimd run --set runtime=120 --set cpu_demand=400 --pretty
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::response::Redirect;
use axum::routing::get;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use scalesim_client::HttpSimulator;
use scalesim_core::{ConfigStore, ScalesimConfig};
use scalesim_dashboard::{DashboardController, DashboardState, dashboard_router};

const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Parser)]
#[command(name = "scalesimd", about = "scalesim simulation dashboard")]
struct Cli {
    /// Path to scalesim.toml; built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the simulator, overriding the config file.
    #[arg(long, global = true, env = "SCALESIM_SIMULATOR_URL")]
    simulator_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,
    },
    /// Run the simulator once and print the projected datasets as JSON.
    Run {
        /// Parameter override, repeatable.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scalesimd=debug,scalesim=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let simulator_url = cli
        .simulator_url
        .unwrap_or_else(|| config.simulator.url.clone());

    match cli.command {
        Command::Serve { port } => serve(&config, &simulator_url, port).await,
        Command::Run { set, pretty } => run_once(&config, &simulator_url, &set, pretty).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ScalesimConfig> {
    match path {
        Some(path) => {
            let config = ScalesimConfig::from_file(path)?;
            info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => Ok(ScalesimConfig::default()),
    }
}

fn build_controller(
    config: &ScalesimConfig,
    simulator_url: &str,
    store: ConfigStore,
) -> anyhow::Result<DashboardController> {
    let simulator = HttpSimulator::new(simulator_url)
        .with_context(|| format!("invalid simulator url {simulator_url:?}"))?;
    info!(endpoint = %simulator.endpoint(), "simulator client ready");

    Ok(DashboardController::new(Arc::new(simulator), store)
        .with_sequencing(config.dashboard.sequencing)
        .with_request_timeout(config.request_timeout()?))
}

async fn serve(config: &ScalesimConfig, simulator_url: &str, port: u16) -> anyhow::Result<()> {
    info!("scalesim daemon starting");

    let store = ConfigStore::with_request(config.initial_request()?);
    let controller = Arc::new(build_controller(config, simulator_url, store)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "dashboard server starting");

    // Graceful shutdown on Ctrl-C.
    serve_dashboard(listener, controller, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    })
    .await?;

    info!("scalesim daemon stopped");
    Ok(())
}

/// Serve the dashboard on `listener` until `shutdown` resolves.
///
/// The initial simulation runs in the background so a slow or stalled
/// simulator never keeps the dashboard from accepting connections.
async fn serve_dashboard(
    listener: TcpListener,
    controller: Arc<DashboardController>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let initial = controller.clone();
    tokio::spawn(async move {
        // A failed first run leaves the charts empty until the next trigger.
        if let Err(e) = initial.initialize().await {
            warn!(error = %e, "initial simulation run failed");
        }
    });

    let router = Router::new()
        .route("/", get(|| async { Redirect::to(DASHBOARD_PATH) }))
        .nest(
            DASHBOARD_PATH,
            dashboard_router(DashboardState::new(controller, DASHBOARD_PATH)),
        );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn run_once(
    config: &ScalesimConfig,
    simulator_url: &str,
    overrides: &[(String, String)],
    pretty: bool,
) -> anyhow::Result<()> {
    let mut store = ConfigStore::with_request(config.initial_request()?);
    for (name, raw) in overrides {
        store.set(name, raw)?;
    }

    let controller = build_controller(config, simulator_url, store)?;
    controller.refresh().await?;

    let projection = controller.published().await.projection;
    let json = if pretty {
        serde_json::to_string_pretty(&projection)?
    } else {
        serde_json::to_string(&projection)?
    };
    println!("{json}");
    Ok(())
}
