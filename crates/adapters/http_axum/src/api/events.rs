//! Business-event intake.

use axum::Json;
use axum::extract::State;

use crmflow_app::orchestrator::AutomationRunner;
use crmflow_app::ports::{AutomationRepository, ContactRepository, ExecutionLog};
use crmflow_domain::execution::RunSummary;
use crmflow_domain::trigger::TriggerEvent;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/events`: run every active automation matching the event.
///
/// Body: `{"kind": "hot_lead", "fields": {"score": 91}}`. Answers with one
/// summary per automation that ran.
pub async fn dispatch<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Json(event): Json<TriggerEvent>,
) -> Result<Json<Vec<RunSummary>>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let summaries = state.event_dispatcher.dispatch(&event).await?;
    Ok(Json(summaries))
}
