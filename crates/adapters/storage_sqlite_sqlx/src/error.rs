//! Storage-specific error type wrapping sqlx errors.

use homemonitor_domain::error::HomeMonitorError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a stored JSON body.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A collection or field name that cannot be embedded in a JSON path.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
}

impl From<StorageError> for HomeMonitorError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
