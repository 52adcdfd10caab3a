//! # sunshaded — sunshade daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the host adapter, the repository and the event bus
//! - Restore persisted automation flags
//! - Spawn the tick loop and the state-change listener
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sunshade_adapter_http_axum::state::AppState;
use sunshade_adapter_storage_sqlite_sqlx::SqliteAutomationStateRepository;
use sunshade_adapter_virtual::VirtualHost;
use sunshade_app::coordinator::CoverCoordinator;
use sunshade_app::event_bus::InProcessEventBus;
use sunshade_app::installation::InstallationState;
use sunshade_app::override_detector::OverrideDetector;
use sunshade_app::services::automation_service::AutomationService;

use crate::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Installation
    let entry = config.entry_data()?;
    let installation = Arc::new(InstallationState::new(config.installation_id()?, entry));
    tracing::info!(
        installation_id = %installation.id(),
        covers = installation.with_entry(|entry| entry.covers().count()),
        "installation loaded"
    );

    // Database
    let db = sunshade_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let repo = Arc::new(SqliteAutomationStateRepository::new(db.pool().clone()));

    // Host
    let host = if config.virtual_host.demo {
        VirtualHost::demo()
    } else {
        VirtualHost::default()
    };
    let host = Arc::new(host.with_states(config.seed_states()));

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));

    // Services
    let automation = Arc::new(AutomationService::new(
        Arc::clone(&installation),
        repo,
        Arc::clone(&event_bus),
    ));
    automation
        .restore()
        .await
        .context("failed to restore automation flags")?;

    // Background tasks; the feed is subscribed before the first tick so no
    // notification caused by it is missed.
    let detector = OverrideDetector::new(Arc::clone(&installation), Arc::clone(&automation));
    let changes = host.subscribe();
    let listener_task = tokio::spawn(async move { detector.run(changes).await });

    let coordinator = CoverCoordinator::new(
        installation,
        config.sources(),
        Arc::clone(&host),
        Arc::clone(&host),
        Arc::clone(&event_bus),
    );
    let period = config.tick_interval();
    let scheduler_task = tokio::spawn(async move { coordinator.run(period).await });

    // HTTP
    let app = sunshade_adapter_http_axum::router::build(AppState::new(automation, event_bus));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("sunshaded listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_task.abort();
    listener_task.abort();
    tracing::info!("sunshaded stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown requested");
}
