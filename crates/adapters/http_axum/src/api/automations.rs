//! JSON REST handlers for automations.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crmflow_app::orchestrator::AutomationRunner;
use crmflow_app::ports::{AutomationRepository, ContactRepository, ExecutionLog};
use crmflow_domain::action::ActionKind;
use crmflow_domain::automation::{Automation, AutomationStatus};
use crmflow_domain::error::CrmFlowError;
use crmflow_domain::execution::{ExecutionRecord, RunSummary};
use crmflow_domain::id::AutomationId;
use crmflow_domain::target_group::TargetGroup;
use crmflow_domain::trigger::TriggerKind;

use crate::error::{ApiError, parse_id};
use crate::state::AppState;

/// Number of history records returned when no `limit` is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Request body for creating or replacing an automation.
#[derive(Deserialize)]
pub struct AutomationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub trigger: TriggerKind,
    pub action: ActionKind,
    #[serde(default)]
    pub message_template: Option<String>,
    #[serde(default)]
    pub webhook_endpoint: Option<String>,
    #[serde(default)]
    pub target_group: Option<TargetGroup>,
    #[serde(default)]
    pub status: Option<AutomationStatus>,
    #[serde(default)]
    pub delay_minutes: Option<u32>,
}

impl AutomationRequest {
    fn into_automation(self, id: Option<AutomationId>) -> Result<Automation, CrmFlowError> {
        let mut builder = Automation::builder()
            .name(self.name)
            .trigger(self.trigger)
            .action(self.action);

        if let Some(id) = id {
            builder = builder.id(id);
        }
        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        if let Some(template) = self.message_template {
            builder = builder.message_template(template);
        }
        if let Some(endpoint) = self.webhook_endpoint.filter(|e| !e.trim().is_empty()) {
            builder = builder.webhook_endpoint(endpoint);
        }
        if let Some(group) = self.target_group {
            builder = builder.target_group(group);
        }
        if let Some(status) = self.status {
            builder = builder.status(status);
        }
        if let Some(minutes) = self.delay_minutes {
            builder = builder.delay_minutes(minutes);
        }

        builder.build()
    }
}

/// Request body for activating or pausing an automation.
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: AutomationStatus,
}

/// Query string of the executions endpoint.
#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Automation>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/automations`: list all automations.
pub async fn list<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
) -> Result<Json<Vec<Automation>>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let automations = state.automation_service.list_automations().await?;
    Ok(Json(automations))
}

/// `GET /api/automations/{id}`: get automation by ID.
pub async fn get<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Path(id): Path<String>,
) -> Result<Json<Automation>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let automation = state
        .automation_service
        .get_automation(parse_id(&id)?)
        .await?;
    Ok(Json(automation))
}

/// `POST /api/automations`: create a new automation.
pub async fn create<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Json(req): Json<AutomationRequest>,
) -> Result<CreateResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let automation = req.into_automation(None)?;
    let created = state
        .automation_service
        .create_automation(automation)
        .await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/automations/{id}`: replace the editable fields of an automation.
///
/// Run statistics are kept.
pub async fn update<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Path(id): Path<String>,
    Json(req): Json<AutomationRequest>,
) -> Result<Json<Automation>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let automation = req.into_automation(Some(parse_id(&id)?))?;
    let updated = state
        .automation_service
        .update_automation(automation)
        .await?;
    Ok(Json(updated))
}

/// `PUT /api/automations/{id}/status`: activate or pause.
pub async fn set_status<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Automation>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let automation = state
        .automation_service
        .set_status(parse_id(&id)?, req.status)
        .await?;
    Ok(Json(automation))
}

/// `DELETE /api/automations/{id}`: delete an automation.
pub async fn delete<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    state
        .automation_service
        .delete_automation(parse_id(&id)?)
        .await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/automations/{id}/run`: run now against every contact,
/// whatever the trigger or status.
pub async fn run_now<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Path(id): Path<String>,
) -> Result<Json<RunSummary>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let automation = state
        .automation_service
        .get_automation(parse_id(&id)?)
        .await?;
    let summary = state.event_dispatcher.run_now(&automation).await;
    Ok(Json(summary))
}

/// `GET /api/automations/{id}/executions?limit=`: newest records first.
pub async fn executions<AR, EL, CR, R>(
    State(state): State<AppState<AR, EL, CR, R>>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ExecutionRecord>>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let records = state
        .automation_service
        .history(parse_id(&id)?, limit)
        .await?;
    Ok(Json(records))
}
