//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod automations;
pub mod catalog;
#[allow(clippy::missing_errors_doc)]
pub mod events;

use axum::Router;
use axum::routing::{get, post, put};

use crmflow_app::orchestrator::AutomationRunner;
use crmflow_app::ports::{AutomationRepository, ContactRepository, ExecutionLog};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<AR, EL, CR, R>() -> Router<AppState<AR, EL, CR, R>>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    Router::new()
        .route("/catalog", get(catalog::get))
        .route(
            "/automations",
            get(automations::list::<AR, EL, CR, R>).post(automations::create::<AR, EL, CR, R>),
        )
        .route(
            "/automations/{id}",
            get(automations::get::<AR, EL, CR, R>)
                .put(automations::update::<AR, EL, CR, R>)
                .delete(automations::delete::<AR, EL, CR, R>),
        )
        .route(
            "/automations/{id}/status",
            put(automations::set_status::<AR, EL, CR, R>),
        )
        .route(
            "/automations/{id}/run",
            post(automations::run_now::<AR, EL, CR, R>),
        )
        .route(
            "/automations/{id}/executions",
            get(automations::executions::<AR, EL, CR, R>),
        )
        .route("/events", post(events::dispatch::<AR, EL, CR, R>))
}
