//! Shared application state for axum handlers.

use std::sync::Arc;

use crmflow_app::event_dispatcher::EventDispatcher;
use crmflow_app::orchestrator::AutomationRunner;
use crmflow_app::ports::{AutomationRepository, ContactRepository, ExecutionLog};
use crmflow_app::services::automation_service::AutomationService;

/// Application state shared across all axum handlers.
///
/// Generic over the automation repository, execution log, contact repository
/// and automation runner to avoid dynamic dispatch. `Clone` is implemented
/// manually so the underlying types themselves do not need to be `Clone`.
pub struct AppState<AR, EL, CR, R> {
    /// Automation management and run history.
    pub automation_service: Arc<AutomationService<AR, EL>>,
    /// Business-event intake and admin run-now.
    pub event_dispatcher: Arc<EventDispatcher<AR, CR, R>>,
}

impl<AR, EL, CR, R> Clone for AppState<AR, EL, CR, R> {
    fn clone(&self) -> Self {
        Self {
            automation_service: Arc::clone(&self.automation_service),
            event_dispatcher: Arc::clone(&self.event_dispatcher),
        }
    }
}

impl<AR, EL, CR, R> AppState<AR, EL, CR, R>
where
    AR: AutomationRepository + Send + Sync + 'static,
    EL: ExecutionLog + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        automation_service: AutomationService<AR, EL>,
        event_dispatcher: EventDispatcher<AR, CR, R>,
    ) -> Self {
        Self::from_arcs(Arc::new(automation_service), Arc::new(event_dispatcher))
    }

    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// Use this when services are shared with background tasks.
    pub fn from_arcs(
        automation_service: Arc<AutomationService<AR, EL>>,
        event_dispatcher: Arc<EventDispatcher<AR, CR, R>>,
    ) -> Self {
        Self {
            automation_service,
            event_dispatcher,
        }
    }
}
