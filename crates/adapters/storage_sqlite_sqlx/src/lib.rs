//! # crmflow-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `AutomationRepository`, `ContactRepository` and
//!   `ExecutionLog` ports defined in `crmflow-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `crmflow-app` (for port traits) and `crmflow-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod automation_repo;
pub mod contact_repo;
pub mod error;
pub mod execution_log;
pub mod pool;

mod codec;

pub use automation_repo::SqliteAutomationRepository;
pub use contact_repo::SqliteContactRepository;
pub use execution_log::SqliteExecutionLog;
pub use pool::{Config, Database};
