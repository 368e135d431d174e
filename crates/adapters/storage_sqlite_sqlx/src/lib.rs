//! # homemonitor-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `DocumentStore` port defined in `homemonitor-app::ports::store`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Translate store queries into `json_extract` predicates over stored bodies
//!
//! ## Dependency rule
//! Depends on `homemonitor-app` (for port traits) and `homemonitor-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod document_store;
pub mod error;
pub mod pool;

pub use document_store::SqliteDocumentStore;
pub use pool::{Config, Database};
