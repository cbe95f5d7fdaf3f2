//! Execution orchestrator: drives one automation run.
//!
//! A run resolves the target group, dispatches the action to each contact
//! strictly in order with a pacing delay between contacts, appends one
//! execution record per attempt, and finally commits the success count to
//! the automation's stats. A failing contact never aborts the run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crmflow_domain::action::ActionParams;
use crmflow_domain::automation::Automation;
use crmflow_domain::contact::Contact;
use crmflow_domain::execution::{ContactOutcome, ExecutionRecord, RunSummary, error_chain};
use crmflow_domain::id::AutomationId;
use crmflow_domain::target_group::TargetGroup;

use crate::dispatcher::ActionExecutor;
use crate::ports::{AutomationRepository, Clock, ContactFilter, ContactRepository, ExecutionLog};

/// Spacing between two consecutive contacts of one run.
pub const DEFAULT_PACING: Duration = Duration::from_secs(2);

/// Runs an automation against a candidate contact set.
pub trait AutomationRunner {
    fn run(
        &self,
        automation: &Automation,
        contacts: Vec<Contact>,
    ) -> impl Future<Output = RunSummary> + Send;
}

impl<T: AutomationRunner + Send + Sync> AutomationRunner for Arc<T> {
    fn run(
        &self,
        automation: &Automation,
        contacts: Vec<Contact>,
    ) -> impl Future<Output = RunSummary> + Send {
        (**self).run(automation, contacts)
    }
}

/// Load the contact set for `filter` and run `automation` on it.
///
/// A failure to load contacts is fatal to the run and yields an aborted
/// summary with zero attempts.
pub async fn run_with_contacts<R, CR>(
    runner: &R,
    contacts: &CR,
    automation: &Automation,
    filter: ContactFilter,
) -> RunSummary
where
    R: AutomationRunner + Sync,
    CR: ContactRepository + Sync,
{
    match contacts.list(filter).await {
        Ok(candidates) => runner.run(automation, candidates).await,
        Err(err) => {
            let reason = error_chain(&err);
            tracing::error!(automation_id = %automation.id, error = %reason, "failed to load contacts");
            RunSummary::aborted(automation.id, reason)
        }
    }
}

/// Default [`AutomationRunner`].
pub struct Orchestrator<AR, EL, X, CK> {
    automations: AR,
    log: EL,
    executor: X,
    clock: CK,
    pacing: Duration,
    cancel: CancellationToken,
    locks: Mutex<HashMap<AutomationId, Arc<Mutex<()>>>>,
}

impl<AR, EL, X, CK> Orchestrator<AR, EL, X, CK>
where
    AR: AutomationRepository + Send + Sync,
    EL: ExecutionLog + Send + Sync,
    X: ActionExecutor + Send + Sync,
    CK: Clock + Send + Sync,
{
    pub fn new(automations: AR, log: EL, executor: X, clock: CK) -> Self {
        Self {
            automations,
            log,
            executor,
            clock,
            pacing: DEFAULT_PACING,
            cancel: CancellationToken::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Stop signal checked between contacts.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn lock_for(&self, id: AutomationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drops the map entry once no other run holds or awaits it.
    async fn release(&self, id: AutomationId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks.get(&id).is_some_and(|held| Arc::strong_count(held) == 1) {
            locks.remove(&id);
        }
    }

    /// Waits out the pacing delay; `false` when the stop signal fired first.
    async fn pace(&self) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(self.pacing) => true,
        }
    }

    async fn attempt(
        &self,
        automation: &Automation,
        params: &ActionParams,
        contact: &Contact,
    ) -> ContactOutcome {
        let result = self
            .executor
            .execute(&automation.action, contact, params)
            .await;
        let at = self.clock.now();
        let record = match &result {
            Ok(_) => ExecutionRecord::success(automation.id, contact.id, at),
            Err(err) => {
                let detail = error_chain(err);
                tracing::warn!(
                    automation_id = %automation.id,
                    contact_id = %contact.id,
                    action = %automation.action,
                    error = %detail,
                    "action failed"
                );
                ExecutionRecord::failure(automation.id, contact.id, at, detail)
            }
        };
        if let Err(err) = self.log.append(record).await {
            tracing::error!(
                automation_id = %automation.id,
                contact_id = %contact.id,
                error = %error_chain(&err),
                "failed to append execution record"
            );
        }
        ContactOutcome::from_result(contact, &result)
    }
}

impl<AR, EL, X, CK> AutomationRunner for Orchestrator<AR, EL, X, CK>
where
    AR: AutomationRepository + Send + Sync,
    EL: ExecutionLog + Send + Sync,
    X: ActionExecutor + Send + Sync,
    CK: Clock + Send + Sync,
{
    #[tracing::instrument(skip_all, fields(automation_id = %automation.id, action = %automation.action))]
    async fn run(&self, automation: &Automation, contacts: Vec<Contact>) -> RunSummary {
        let lock = self.lock_for(automation.id).await;
        let summary = {
            let _guard = lock.lock().await;
            self.run_exclusive(automation, contacts).await
        };
        self.release(automation.id, lock).await;
        summary
    }
}

impl<AR, EL, X, CK> Orchestrator<AR, EL, X, CK>
where
    AR: AutomationRepository + Send + Sync,
    EL: ExecutionLog + Send + Sync,
    X: ActionExecutor + Send + Sync,
    CK: Clock + Send + Sync,
{
    async fn run_exclusive(&self, automation: &Automation, contacts: Vec<Contact>) -> RunSummary {
        if let TargetGroup::Unrecognized(name) = &automation.target_group {
            tracing::warn!(group = %name, "unrecognized target group, using all contacts");
        }
        let targets = automation.target_group.resolve(contacts, self.clock.now());
        let mut summary = RunSummary::empty(automation.id);
        if targets.is_empty() {
            tracing::info!("no contacts in target group");
            return summary;
        }

        let params = automation.action_params();

        for (index, contact) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() || (index > 0 && !self.pace().await) {
                tracing::info!(remaining = targets.len() - index, "run cancelled");
                summary.cancelled = true;
                break;
            }
            summary.push(self.attempt(automation, &params, contact).await);
        }

        if summary.attempted > 0 {
            let successes = u64::try_from(summary.succeeded).unwrap_or(u64::MAX);
            let at = automation
                .last_run_at
                .map_or_else(|| self.clock.now(), |prev| prev.max(self.clock.now()));
            if let Err(err) = self.automations.record_run(automation.id, successes, at).await {
                tracing::error!(error = %error_chain(&err), "failed to record run stats");
            }
        }

        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            "automation run finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{ActionDispatcher, DispatcherConfig};
    use crate::testing::{
        FixedClock, InMemoryAutomationRepo, InMemoryContactRepo, InMemoryExecutionLog,
        RecordingOpener, RecordingWebhookSender,
    };
    use crmflow_domain::action::{ActionKind, DirectAction, LocalAction, WebhookAction};
    use crmflow_domain::execution::Outcome;
    use crmflow_domain::trigger::TriggerKind;

    type TestDispatcher = ActionDispatcher<
        Arc<InMemoryContactRepo>,
        Arc<RecordingOpener>,
        RecordingWebhookSender,
        Arc<FixedClock>,
    >;
    type TestOrchestrator = Orchestrator<
        Arc<InMemoryAutomationRepo>,
        Arc<InMemoryExecutionLog>,
        TestDispatcher,
        Arc<FixedClock>,
    >;

    struct Harness {
        orchestrator: TestOrchestrator,
        automations: Arc<InMemoryAutomationRepo>,
        log: Arc<InMemoryExecutionLog>,
        opener: Arc<RecordingOpener>,
    }

    fn harness(automations: Vec<Automation>) -> Harness {
        harness_with(automations, RecordingWebhookSender::default())
    }

    fn harness_with(automations: Vec<Automation>, webhooks: RecordingWebhookSender) -> Harness {
        let automations = Arc::new(InMemoryAutomationRepo::with(automations));
        let log = Arc::new(InMemoryExecutionLog::default());
        let opener = Arc::new(RecordingOpener::default());
        let clock = Arc::new(FixedClock::at(crmflow_domain::time::now()));
        let dispatcher = ActionDispatcher::new(
            Arc::new(InMemoryContactRepo::default()),
            Arc::clone(&opener),
            webhooks,
            Arc::clone(&clock),
            DispatcherConfig::default(),
        );
        Harness {
            orchestrator: Orchestrator::new(
                Arc::clone(&automations),
                Arc::clone(&log),
                dispatcher,
                clock,
            )
            .with_pacing(Duration::ZERO),
            automations,
            log,
            opener,
        }
    }

    fn lead(name: &str, score: u8, whatsapp: &str) -> Contact {
        Contact::builder()
            .name(name)
            .score(score)
            .whatsapp(whatsapp)
            .build()
            .unwrap()
    }

    fn automation(action: ActionKind, group: TargetGroup) -> Automation {
        Automation::builder()
            .name("run")
            .trigger(TriggerKind::HotLead)
            .action(action)
            .target_group(group)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_only_message_hot_leads() {
        let auto = automation(
            ActionKind::Direct(DirectAction::SendWhatsapp),
            TargetGroup::HotLeads,
        );
        let h = harness(vec![auto.clone()]);
        let contacts = vec![
            lead("Hot", 85, "5511999999999"),
            lead("Cold", 40, "5511888888888"),
        ];

        let summary = h.orchestrator.run(&auto, contacts).await;

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.details[0].contact_name, "Hot");
        let opened = h.opener.whatsapp.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].0, "5511999999999");
    }

    #[tokio::test]
    async fn should_fail_every_contact_without_webhook_endpoint() {
        let auto = automation(ActionKind::Webhook(WebhookAction::Make), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let contacts = (0..3).map(|i| lead(&format!("c{i}"), 50, "1")).collect();

        let summary = h.orchestrator.run(&auto, contacts).await;

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 0);
        assert!(summary.details.iter().all(|d| d.detail == "no endpoint configured for make"));
        assert!(h.log.all().iter().all(|r| r.outcome == Outcome::Failed));
        assert_eq!(h.automations.snapshot(auto.id).execution_count, 0);
    }

    #[tokio::test]
    async fn should_continue_after_a_failing_contact() {
        let auto = automation(
            ActionKind::Direct(DirectAction::SendWhatsapp),
            TargetGroup::All,
        );
        let h = harness(vec![auto.clone()]);
        let mut contacts: Vec<Contact> = (1..=5)
            .map(|i| lead(&format!("c{i}"), 50, "5511900000000"))
            .collect();
        contacts[1].whatsapp = None;

        let summary = h.orchestrator.run(&auto, contacts).await;

        assert_eq!(summary.details.len(), 5);
        assert_eq!(summary.details[1].outcome, Outcome::Failed);
        assert!(summary.details[2..].iter().all(|d| d.outcome == Outcome::Success));
        assert_eq!(summary.succeeded, 4);
        assert_eq!(h.log.all().len(), 5);
    }

    #[tokio::test]
    async fn should_add_successes_to_execution_count_and_advance_last_run() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let contacts: Vec<Contact> = (0..3).map(|i| lead(&format!("c{i}"), 10, "1")).collect();

        h.orchestrator.run(&auto, contacts.clone()).await;
        let after_first = h.automations.snapshot(auto.id);
        h.orchestrator.run(&after_first, contacts).await;
        let after_second = h.automations.snapshot(auto.id);

        assert_eq!(after_first.execution_count, 3);
        assert_eq!(after_second.execution_count, 6);
        assert!(after_second.last_run_at >= after_first.last_run_at);
        let last_record = h.log.all().last().unwrap().timestamp;
        assert!(after_second.last_run_at.unwrap() >= last_record);
    }

    #[tokio::test]
    async fn should_return_empty_summary_without_touching_stats() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::Customers);
        let h = harness(vec![auto.clone()]);

        let summary = h.orchestrator.run(&auto, vec![lead("Lead", 90, "1")]).await;

        assert_eq!(summary, RunSummary::empty(auto.id));
        let stored = h.automations.snapshot(auto.id);
        assert_eq!(stored.execution_count, 0);
        assert!(stored.last_run_at.is_none());
        assert!(h.log.all().is_empty());
    }

    #[tokio::test]
    async fn should_treat_unrecognized_group_as_all() {
        let auto = automation(
            ActionKind::Local(LocalAction::BackupData),
            TargetGroup::Unrecognized("bogus".to_string()),
        );
        let h = harness(vec![auto.clone()]);
        let contacts: Vec<Contact> = (0..60).map(|i| lead(&format!("c{i}"), 10, "1")).collect();

        let summary = h.orchestrator.run(&auto, contacts).await;

        assert_eq!(summary.attempted, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn should_pace_consecutive_contacts() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let orchestrator = h.orchestrator.with_pacing(DEFAULT_PACING);
        let contacts: Vec<Contact> = (0..3).map(|i| lead(&format!("c{i}"), 10, "1")).collect();

        let started = tokio::time::Instant::now();
        let summary = orchestrator.run(&auto, contacts).await;

        assert_eq!(summary.attempted, 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_PACING * 2);
        assert!(elapsed < DEFAULT_PACING * 3);
    }

    #[tokio::test]
    async fn should_stop_before_first_contact_when_cancelled() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let cancel = CancellationToken::new();
        let orchestrator = h.orchestrator.with_cancellation(cancel.clone());
        cancel.cancel();

        let summary = orchestrator.run(&auto, vec![lead("c", 10, "1")]).await;

        assert!(summary.cancelled);
        assert_eq!(summary.attempted, 0);
        assert_eq!(h.automations.snapshot(auto.id).execution_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_commit_attempted_contacts_when_cancelled_during_pacing() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let cancel = CancellationToken::new();
        let orchestrator = Arc::new(
            h.orchestrator
                .with_pacing(Duration::from_secs(60))
                .with_cancellation(cancel.clone()),
        );
        let contacts: Vec<Contact> = (0..3).map(|i| lead(&format!("c{i}"), 10, "1")).collect();

        let task = {
            let orchestrator = Arc::clone(&orchestrator);
            let auto = auto.clone();
            tokio::spawn(async move { orchestrator.run(&auto, contacts).await })
        };
        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
        let summary = task.await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.attempted, 1);
        assert_eq!(h.automations.snapshot(auto.id).execution_count, 1);
    }

    #[tokio::test]
    async fn should_serialize_concurrent_runs_of_same_automation() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let contacts: Vec<Contact> = (0..4).map(|i| lead(&format!("c{i}"), 10, "1")).collect();

        tokio::join!(
            h.orchestrator.run(&auto, contacts.clone()),
            h.orchestrator.run(&auto, contacts),
        );

        assert_eq!(h.automations.snapshot(auto.id).execution_count, 8);
        assert_eq!(h.log.all().len(), 8);
    }

    #[tokio::test]
    async fn should_forget_automation_lock_after_runs_complete() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let contacts: Vec<Contact> = (0..2).map(|i| lead(&format!("c{i}"), 10, "1")).collect();

        tokio::join!(
            h.orchestrator.run(&auto, contacts.clone()),
            h.orchestrator.run(&auto, contacts),
        );

        assert!(h.orchestrator.locks.lock().await.is_empty());
        assert_eq!(h.automations.snapshot(auto.id).execution_count, 4);
    }

    #[tokio::test]
    async fn should_abort_when_contacts_cannot_be_loaded() {
        let auto = automation(ActionKind::Local(LocalAction::BackupData), TargetGroup::All);
        let h = harness(vec![auto.clone()]);
        let contacts = InMemoryContactRepo::unavailable();

        let summary = run_with_contacts(&h.orchestrator, &contacts, &auto, ContactFilter::All).await;

        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.aborted.as_deref(), Some("storage error: contacts unavailable"));
        assert!(h.log.all().is_empty());
    }
}
