//! # sunshade-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `AutomationStateRepository` from `sunshade-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `sunshade-app` (for port traits) and `sunshade-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod automation_state_repo;
pub mod error;
pub mod pool;

pub use automation_state_repo::SqliteAutomationStateRepository;
pub use pool::{Config, Database};
