//! # crmflowd: crmflow daemon
//!
//! Composition root that wires all adapters together, starts the scheduler
//! and serves the HTTP API.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and install logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository and outbound implementations (adapters)
//! - Construct the engine (dispatcher, orchestrator, scheduler, event
//!   dispatcher), injecting adapters via port traits
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT): stop the scheduler and cancel
//!   in-flight runs between contacts
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crmflow_adapter_http_axum::state::AppState;
use crmflow_adapter_storage_sqlite_sqlx::{
    SqliteAutomationRepository, SqliteContactRepository, SqliteExecutionLog,
};
use crmflow_app::dispatcher::{ActionDispatcher, DispatcherConfig};
use crmflow_app::event_dispatcher::EventDispatcher;
use crmflow_app::orchestrator::Orchestrator;
use crmflow_app::ports::SystemClock;
use crmflow_app::scheduler::Scheduler;
use crmflow_app::services::automation_service::AutomationService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = crmflow_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let automations = Arc::new(SqliteAutomationRepository::new(pool.clone()));
    let contacts = Arc::new(SqliteContactRepository::new(pool.clone()));
    let log = Arc::new(SqliteExecutionLog::new(pool));

    // Outbound
    let (webhooks, opener) = crmflow_adapter_outbound_reqwest::Config {
        timeout: config.webhook_timeout(),
        launch_links: config.outbound.launch_links,
    }
    .build()?;

    // Engine
    let cancel = CancellationToken::new();
    let dispatcher = ActionDispatcher::new(
        Arc::clone(&contacts),
        opener,
        webhooks,
        SystemClock,
        DispatcherConfig {
            endpoints: config.integrations.clone(),
            assignees: config.engine.assignees.clone(),
        },
    );
    let orchestrator = Arc::new(
        Orchestrator::new(Arc::clone(&automations), Arc::clone(&log), dispatcher, SystemClock)
            .with_pacing(config.pacing())
            .with_cancellation(cancel.clone()),
    );
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&automations),
        Arc::clone(&contacts),
        Arc::clone(&orchestrator),
        SystemClock,
        config.schedule_rules()?,
    ));
    let scheduler = scheduler.start(config.tick_interval());
    tracing::info!(interval = ?config.tick_interval(), "scheduler started");

    let event_dispatcher = EventDispatcher::new(Arc::clone(&automations), contacts, orchestrator);
    let automation_service = AutomationService::new(automations, log);

    // HTTP
    let state = AppState::new(automation_service, event_dispatcher);
    let app = crmflow_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "crmflowd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    scheduler.stop().await;
    tracing::info!("crmflowd stopped");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    cancel.cancel();
}
