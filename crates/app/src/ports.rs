//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod automation_repo;
pub mod clock;
pub mod contact_repo;
pub mod execution_log;
pub mod outbound;

pub use automation_repo::AutomationRepository;
pub use clock::{Clock, SystemClock};
pub use contact_repo::{ContactFilter, ContactRepository};
pub use execution_log::ExecutionLog;
pub use outbound::{ChannelOpener, WebhookSender};
