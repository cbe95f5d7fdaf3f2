//! Time-based scheduler: runs automations whose calendar trigger is due.
//!
//! Each tick lists the active automations, keeps those with a time-based
//! trigger that [`ScheduleRules::is_due`] at the clock's current time, and
//! runs them one after the other against every contact. Every automation
//! moves `Idle → Due → Running → Idle` within a tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crmflow_domain::automation::Automation;
use crmflow_domain::error::CrmFlowError;
use crmflow_domain::execution::{RunSummary, error_chain};
use crmflow_domain::id::AutomationId;
use crmflow_domain::schedule::ScheduleRules;

use crate::orchestrator::{AutomationRunner, run_with_contacts};
use crate::ports::{AutomationRepository, Clock, ContactFilter, ContactRepository};

/// Default interval between two ticks.
pub const DEFAULT_TICK: Duration = Duration::from_secs(300);

/// Scheduling state of one automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleState {
    #[default]
    Idle,
    Due,
    Running,
}

/// Recurring driver for `time_based`, `weekly_report` and `monthly_backup`
/// automations.
pub struct Scheduler<AR, CR, R, CK> {
    automations: AR,
    contacts: CR,
    runner: R,
    clock: CK,
    rules: ScheduleRules,
    states: Mutex<HashMap<AutomationId, ScheduleState>>,
}

impl<AR, CR, R, CK> Scheduler<AR, CR, R, CK>
where
    AR: AutomationRepository + Send + Sync,
    CR: ContactRepository + Send + Sync,
    R: AutomationRunner + Send + Sync,
    CK: Clock + Send + Sync,
{
    pub fn new(automations: AR, contacts: CR, runner: R, clock: CK, rules: ScheduleRules) -> Self {
        Self {
            automations,
            contacts,
            runner,
            clock,
            rules,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Current state of an automation; unknown automations are idle.
    #[must_use]
    pub fn state(&self, id: AutomationId) -> ScheduleState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    fn set_state(&self, id: AutomationId, state: ScheduleState) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        if state == ScheduleState::Idle {
            states.remove(&id);
        } else {
            states.insert(id, state);
        }
    }

    /// Run every due automation once, sequentially.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the active automations cannot be listed.
    /// Failures inside a run are reported in its summary instead.
    pub async fn tick(&self) -> Result<Vec<RunSummary>, CrmFlowError> {
        let now = self.clock.now();
        let due: Vec<Automation> = self
            .automations
            .list_active(None)
            .await?
            .into_iter()
            .filter(|a| a.is_active() && a.trigger.is_time_based() && self.rules.is_due(a, now))
            .collect();
        tracing::debug!(due = due.len(), "scheduler tick");

        for automation in &due {
            self.set_state(automation.id, ScheduleState::Due);
        }

        let mut summaries = Vec::with_capacity(due.len());
        for automation in &due {
            self.set_state(automation.id, ScheduleState::Running);
            tracing::info!(
                automation_id = %automation.id,
                trigger = %automation.trigger,
                "running scheduled automation"
            );
            let summary =
                run_with_contacts(&self.runner, &self.contacts, automation, ContactFilter::All)
                    .await;
            self.set_state(automation.id, ScheduleState::Idle);
            summaries.push(summary);
        }
        Ok(summaries)
    }
}

impl<AR, CR, R, CK> Scheduler<AR, CR, R, CK>
where
    AR: AutomationRepository + Send + Sync + 'static,
    CR: ContactRepository + Send + Sync + 'static,
    R: AutomationRunner + Send + Sync + 'static,
    CK: Clock + Send + Sync + 'static,
{
    /// Tick every `interval` on a background task until stopped.
    ///
    /// The first tick happens immediately.
    #[must_use]
    pub fn start(self: Arc<Self>, interval: Duration) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.tick().await {
                            tracing::error!(error = %error_chain(&err), "scheduler tick failed");
                        }
                    }
                }
            }
            tracing::info!("scheduler stopped");
        });
        SchedulerHandle { cancel, task }
    }
}

/// Running scheduler; dropping it leaves the task running.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop ticking and wait for the in-flight tick to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "scheduler task failed");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
