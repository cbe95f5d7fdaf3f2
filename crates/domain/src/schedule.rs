//! Schedule: dueness of time-based triggers.

use chrono::{Datelike, Duration, FixedOffset, Offset, Utc, Weekday};

use crate::automation::Automation;
use crate::time::Timestamp;
use crate::trigger::TriggerKind;

/// Delay applied to `time_based` automations without `delay_minutes`.
pub const DEFAULT_DELAY_MINUTES: u32 = 24 * 60;

/// Minimum spacing between two weekly reports.
const WEEKLY_MIN_GAP_DAYS: i64 = 6;

/// Calendar settings shared by every time-based trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRules {
    /// Day on which `weekly_report` automations run.
    pub report_weekday: Weekday,
    /// Offset the weekday and day of month are read in. UTC by default.
    pub utc_offset: FixedOffset,
}

impl Default for ScheduleRules {
    fn default() -> Self {
        Self {
            report_weekday: Weekday::Sun,
            utc_offset: Utc.fix(),
        }
    }
}

impl ScheduleRules {
    /// Whether `automation` should run at `now`.
    ///
    /// Event-driven triggers are never due. An automation that never ran
    /// is due as soon as its calendar condition holds. Calendar conditions
    /// are evaluated in [`ScheduleRules::utc_offset`].
    #[must_use]
    pub fn is_due(&self, automation: &Automation, now: Timestamp) -> bool {
        let last = automation.last_run_at;
        let local = now.with_timezone(&self.utc_offset);
        match automation.trigger {
            TriggerKind::TimeBased => {
                let delay = automation.delay_minutes.unwrap_or(DEFAULT_DELAY_MINUTES);
                last.is_none_or(|ts| now - ts >= Duration::minutes(i64::from(delay)))
            }
            TriggerKind::WeeklyReport => {
                local.weekday() == self.report_weekday
                    && last.is_none_or(|ts| now - ts >= Duration::days(WEEKLY_MIN_GAP_DAYS))
            }
            TriggerKind::MonthlyBackup => {
                local.day() == 1
                    && last.is_none_or(|ts| {
                        let ts = ts.with_timezone(&self.utc_offset);
                        (ts.year(), ts.month()) != (local.year(), local.month())
                    })
            }
            _ => false,
        }
    }
}
