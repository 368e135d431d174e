//! # homemonitord: homemonitor daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the document store, the listing cache and the services
//! - Declare store indexes and warm the device listing
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

use homemonitor_adapter_http_axum::router;
use homemonitor_adapter_http_axum::state::AppState;
use homemonitor_app::list_cache::ListCache;
use homemonitor_app::services::{DeviceService, EntityPersister, ReportService};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.logging.filter).context("parsing log filter")?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database
    let db = homemonitor_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
    }
    .build()
    .await
    .context("opening database")?;
    let store = db.document_store();

    // Services
    let persister = EntityPersister::new(store).with_timeout(config.store_timeout());
    let cache = Arc::new(ListCache::new());
    let device_service = Arc::new(DeviceService::new(persister.clone(), cache));
    let report_service = Arc::new(ReportService::new(persister));

    device_service
        .declare_indexes()
        .await
        .context("declaring device indexes")?;
    report_service
        .declare_indexes()
        .await
        .context("declaring report indexes")?;
    if config.cache.warm_on_start {
        device_service.warm_cache().await;
    }

    // HTTP
    let app = router::build(AppState::from_arcs(device_service, report_service));

    let bind_addr = config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "homemonitord listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;
    db.close().await;
    tracing::info!("homemonitord stopped");

    Ok(())
}

/// Resolve on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
