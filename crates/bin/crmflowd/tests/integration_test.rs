//! End-to-end tests for the full crmflowd stack.
//!
//! Each test wires the complete application (in-memory `SQLite`, real repos,
//! real engine, reqwest webhooks against a local mock server, real axum
//! router) and exercises the HTTP layer via `tower::ServiceExt::oneshot`;
//! no TCP port is bound for the API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crmflow_adapter_http_axum::router;
use crmflow_adapter_http_axum::state::AppState;
use crmflow_adapter_outbound_reqwest::{DeepLinkOpener, ReqwestWebhookSender};
use crmflow_adapter_storage_sqlite_sqlx::{
    Config, SqliteAutomationRepository, SqliteContactRepository, SqliteExecutionLog,
};
use crmflow_app::dispatcher::{ActionDispatcher, DispatcherConfig};
use crmflow_app::event_dispatcher::EventDispatcher;
use crmflow_app::orchestrator::Orchestrator;
use crmflow_app::ports::{AutomationRepository, SystemClock};
use crmflow_app::scheduler::Scheduler;
use crmflow_app::services::automation_service::AutomationService;
use crmflow_domain::action::{ActionKind, LocalAction};
use crmflow_domain::automation::Automation;
use crmflow_domain::contact::Contact;
use crmflow_domain::schedule::ScheduleRules;
use crmflow_domain::trigger::TriggerKind;

type Runner = Orchestrator<
    Arc<SqliteAutomationRepository>,
    Arc<SqliteExecutionLog>,
    ActionDispatcher<Arc<SqliteContactRepository>, DeepLinkOpener, ReqwestWebhookSender, SystemClock>,
    SystemClock,
>;

struct Stack {
    app: axum::Router,
    automations: Arc<SqliteAutomationRepository>,
    contacts: Arc<SqliteContactRepository>,
    runner: Arc<Runner>,
    people: Vec<Contact>,
}

/// Wire the whole daemon against an in-memory database seeded with three
/// contacts: two hot leads (one without any phone) and a cold one.
async fn stack() -> Stack {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let pool = db.pool().clone();

    let automations = Arc::new(SqliteAutomationRepository::new(pool.clone()));
    let contacts = Arc::new(SqliteContactRepository::new(pool.clone()));
    let log = Arc::new(SqliteExecutionLog::new(pool));

    let people = vec![
        Contact::builder()
            .name("Ana")
            .email("ana@example.com")
            .whatsapp("+55 (11) 98888-0001")
            .company("Acme")
            .score(92)
            .build()
            .unwrap(),
        Contact::builder()
            .name("Bo")
            .email("bo@example.com")
            .score(85)
            .build()
            .unwrap(),
        Contact::builder()
            .name("Cy")
            .email("cy@example.com")
            .phone("11 3333-0003")
            .score(12)
            .build()
            .unwrap(),
    ];
    for person in &people {
        contacts.insert(person).await.unwrap();
    }

    let dispatcher = ActionDispatcher::new(
        Arc::clone(&contacts),
        DeepLinkOpener::new(false),
        ReqwestWebhookSender::new(Duration::from_secs(2)).unwrap(),
        SystemClock,
        DispatcherConfig::default(),
    );
    let runner = Arc::new(
        Orchestrator::new(Arc::clone(&automations), Arc::clone(&log), dispatcher, SystemClock)
            .with_pacing(Duration::ZERO),
    );

    let state = AppState::new(
        AutomationService::new(Arc::clone(&automations), log),
        EventDispatcher::new(
            Arc::clone(&automations),
            Arc::clone(&contacts),
            Arc::clone(&runner),
        ),
    );

    Stack {
        app: router::build(state),
        automations,
        contacts,
        runner,
        people,
    }
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create(app: &axum::Router, body: Value) -> String {
    let (status, created) = send(app, "POST", "/api/automations", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack().await;

    let response = stack
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_post_webhook_envelope_to_every_hot_lead_on_run_now() {
    let stack = stack().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catch"))
        .and(body_partial_json(json!({
            "source": "CRM_Automation",
            "platform": "zapier",
            "automation_triggered": true
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let id = create(
        &stack.app,
        json!({
            "name": "Sync hot leads",
            "trigger": "hot_lead",
            "action": "zapier_webhook",
            "webhook_endpoint": format!("{}/catch", server.uri()),
            "target_group": "hot_leads"
        }),
    )
    .await;

    let (status, summary) = send(&stack.app, "POST", &format!("/api/automations/{id}/run"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["attempted"], 2);
    assert_eq!(summary["succeeded"], 2);

    let (_, automation) = send(&stack.app, "GET", &format!("/api/automations/{id}"), None).await;
    assert_eq!(automation["execution_count"], 2);
    assert!(automation["last_run_at"].is_string());

    let (_, history) = send(
        &stack.app,
        "GET",
        &format!("/api/automations/{id}/executions?limit=10"),
        None,
    )
    .await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r["outcome"] == "success"));
}

#[tokio::test]
async fn should_record_failure_and_continue_when_endpoint_rejects() {
    let stack = stack().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let id = create(
        &stack.app,
        json!({
            "name": "Broken hook",
            "trigger": "deal_won",
            "action": "make_webhook",
            "webhook_endpoint": server.uri()
        }),
    )
    .await;

    let (_, summaries) = send(
        &stack.app,
        "POST",
        "/api/events",
        Some(json!({"kind": "deal_won", "fields": {"status": "won"}})),
    )
    .await;

    assert_eq!(summaries[0]["attempted"], 3);
    assert_eq!(summaries[0]["succeeded"], 0);
    let (_, automation) = send(&stack.app, "GET", &format!("/api/automations/{id}"), None).await;
    assert_eq!(automation["execution_count"], 0);
    let (_, history) = send(&stack.app, "GET", &format!("/api/automations/{id}/executions"), None).await;
    assert!(
        history
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["outcome"] == "failed" && r["error_detail"].is_string())
    );
}

#[tokio::test]
async fn should_isolate_missing_channel_failures_on_events() {
    let stack = stack().await;
    create(
        &stack.app,
        json!({
            "name": "Greet",
            "trigger": "hot_lead",
            "action": "send_whatsapp",
            "message_template": "Hi {name} from {company}",
            "target_group": "hot_leads"
        }),
    )
    .await;

    let (status, summaries) = send(
        &stack.app,
        "POST",
        "/api/events",
        Some(json!({"kind": "hot_lead", "fields": {"score": 95}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let summary = &summaries[0];
    assert_eq!(summary["attempted"], 2);
    assert_eq!(summary["succeeded"], 1);
    let failed = summary["details"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["outcome"] == "failed")
        .unwrap();
    assert_eq!(failed["contact_name"], "Bo");
}

#[tokio::test]
async fn should_append_note_to_the_event_contact_only() {
    let stack = stack().await;
    let target = &stack.people[2];
    let auto = Automation::builder()
        .name("Log new leads")
        .trigger(TriggerKind::NewLead)
        .action(ActionKind::Local(LocalAction::AddNote))
        .message_template("Welcome {name}")
        .build()
        .unwrap();
    stack.automations.create(auto).await.unwrap();

    let (_, summaries) = send(
        &stack.app,
        "POST",
        "/api/events",
        Some(json!({"kind": "new_lead", "fields": {"contact_id": target.id.to_string()}})),
    )
    .await;

    assert_eq!(summaries[0]["attempted"], 1);
    assert_eq!(summaries[0]["succeeded"], 1);
    let notes = stack.contacts.notes(target.id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert!(stack.contacts.notes(stack.people[0].id).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_ignore_unknown_and_paused_triggers() {
    let stack = stack().await;
    let id = create(
        &stack.app,
        json!({"name": "Paused", "trigger": "deal_lost", "action": "log_activity"}),
    )
    .await;
    send(
        &stack.app,
        "PUT",
        &format!("/api/automations/{id}/status"),
        Some(json!({"status": "paused"})),
    )
    .await;

    let (_, paused) = send(
        &stack.app,
        "POST",
        "/api/events",
        Some(json!({"kind": "deal_lost", "fields": {"status": "lost"}})),
    )
    .await;
    let (_, unknown) = send(
        &stack.app,
        "POST",
        "/api/events",
        Some(json!({"kind": "lunar_eclipse", "fields": {}})),
    )
    .await;

    assert_eq!(paused, json!([]));
    assert_eq!(unknown, json!([]));
}

#[tokio::test]
async fn should_run_never_run_time_based_automation_on_first_tick() {
    let stack = stack().await;
    let auto = Automation::builder()
        .name("Daily digest")
        .trigger(TriggerKind::TimeBased)
        .action(ActionKind::Local(LocalAction::LogActivity))
        .build()
        .unwrap();
    let id = auto.id;
    stack.automations.create(auto).await.unwrap();
    let scheduler = Scheduler::new(
        Arc::clone(&stack.automations),
        Arc::clone(&stack.contacts),
        Arc::clone(&stack.runner),
        SystemClock,
        ScheduleRules::default(),
    );

    let first = scheduler.tick().await.unwrap();
    let second = scheduler.tick().await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].succeeded, 3);
    assert!(second.is_empty());
    let stored = stack.automations.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.execution_count, 3);
}

#[tokio::test]
async fn should_reject_malformed_requests() {
    let stack = stack().await;

    let (bad_id, _) = send(&stack.app, "GET", "/api/automations/42", None).await;
    let (bad_endpoint, body) = send(
        &stack.app,
        "POST",
        "/api/automations",
        Some(json!({
            "name": "Bad",
            "trigger": "deal_won",
            "action": "slack_notify",
            "webhook_endpoint": "ftp://nowhere"
        })),
    )
    .await;

    assert_eq!(bad_id, StatusCode::BAD_REQUEST);
    assert_eq!(bad_endpoint, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "webhook endpoint must be an http(s) URL");
}
