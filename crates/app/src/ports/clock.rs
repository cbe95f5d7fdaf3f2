//! Clock port: the time source used for dueness, records and stats.

use crmflow_domain::time::Timestamp;

/// Supplies the current time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        crmflow_domain::time::now()
    }
}

impl<T: Clock + Send + Sync> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
