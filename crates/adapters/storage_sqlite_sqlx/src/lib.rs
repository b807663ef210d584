//! # vdev-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`RecordStore`](vdev_app::ports::RecordStore) port
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between device records and database rows (records travel as JSON)
//!
//! ## Dependency rule
//! Depends on `vdev-app` (for port traits) and `vdev-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod record_store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use record_store::SqliteRecordStore;
