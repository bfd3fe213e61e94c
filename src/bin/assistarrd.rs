//! assistarrd: Assistarr daemon.
//!
//! Serves the integration core over HTTP to the web app, which forwards
//! the authenticated user in the `x-assistarr-user` header.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use assistarr::server::config::Config;
use assistarr::server::router;
use assistarr::{
    Assistarr, AssistarrError, FileConfigStore, MemoryConfigStore, ServiceConfigStore,
};

/// Assistarr daemon: media stack integration service.
#[derive(Parser)]
#[command(name = "assistarrd")]
#[command(version = assistarr::PKG_VERSION)]
#[command(about = "Assistarr integration daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file for per-user service settings (overrides `[store] path`).
    #[arg(long, env = "ASSISTARR_STORE")]
    store: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("assistarr=info,tower_http=info")
            }),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let store: Arc<dyn ServiceConfigStore> = match args.store.or(config.store.path.clone()) {
        Some(path) => {
            info!(path = %path.display(), "using file-backed settings store");
            Arc::new(FileConfigStore::open(path)?)
        }
        None => {
            info!("using in-memory settings store; settings are lost on restart");
            Arc::new(MemoryConfigStore::new())
        }
    };

    let assistarr = Assistarr::builder()
        .store(store)
        .timeouts(config.upstream.timeouts())
        .discovery(config.discovery.to_config())
        .retry(config.retry.to_config())
        .build()?;

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| AssistarrError::Configuration(format!("Invalid address: {e}")))?;

    let limits = &config.server.limits;
    let app = router(Arc::new(assistarr))
        .layer(ConcurrencyLimitLayer::new(limits.max_concurrent_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(
            limits.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(version = assistarr::version_string(), %addr, "assistarrd starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("assistarrd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
