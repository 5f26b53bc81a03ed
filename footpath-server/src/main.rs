//! footpath-server: walking routes over a footpath network, served over HTTP.
//!
//! The network is loaded from GeoJSON and repaired once at startup. Every
//! request routes on its own copy of the shared graph.

mod app;
mod config;
mod error;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use footpath_core::{build_footpath_graph, load_footpaths_geojson};
use tokio::net::TcpListener;

use crate::app::{AppState, build_router};
use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Parser, Debug)]
#[command(version, about = "Walking route service over a footpath network")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GeoJSON footpath file, overrides `footpaths` from the config
    #[arg(long)]
    footpaths: Option<PathBuf>,

    /// Listen address, overrides `bind` from the config
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Endpoint tolerance in meters, overrides the config
    #[arg(long)]
    endpoint_tolerance: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(footpaths) = cli.footpaths {
        config.footpaths = Some(footpaths);
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(tolerance) = cli.endpoint_tolerance {
        config.engine.repair.endpoint_tolerance_m = tolerance;
    }
    let config = config.validated()?;

    let footpaths = config.footpaths.clone().ok_or(ServerError::MissingFootpaths)?;
    let engine = config.engine.clone();

    let state = tokio::task::spawn_blocking(move || -> Result<AppState, ServerError> {
        let features = load_footpaths_geojson(&footpaths)?;
        let (graph, stats) = build_footpath_graph(&features, &engine.repair);
        Ok(AppState {
            graph,
            stats,
            config: engine,
        })
    })
    .await??;

    tracing::info!(
        "Footpath graph ready: {} nodes, {} edges, {} components",
        state.graph.node_count(),
        state.graph.edge_count(),
        state.graph.component_count()
    );

    let app = build_router(Arc::new(state), &config);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("footpath-server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
