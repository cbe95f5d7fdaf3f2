//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crmflow_app::orchestrator::AutomationRunner;
use crmflow_app::ports::{AutomationRepository, ContactRepository, ExecutionLog};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api`. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level.
pub fn build<AR, EL, CR, R>(state: AppState<AR, EL, CR, R>) -> Router
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
