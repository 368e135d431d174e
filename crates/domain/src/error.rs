//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomeMonitorError`] via `#[from]`.

/// Top-level error shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum HomeMonitorError {
    /// A value failed a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A date string matched none of the accepted formats.
    #[error("invalid date")]
    InvalidDate(#[from] InvalidDateError),

    /// The requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The store did not answer within the configured timeout.
    #[error("store unavailable")]
    StoreUnavailable(#[from] StoreUnavailableError),

    /// An opaque failure reported by a storage adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Reasons a value or a request is rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("owner must not be empty")]
    EmptyOwner,
    #[error("web page url id must not be empty")]
    EmptyWebPageUrlId,
    #[error("document `{collection}` has no id and its identity is not store-assigned")]
    MissingId { collection: &'static str },
    #[error("field name `{0}` is not a valid document field")]
    InvalidFieldName(String),
}

/// A date string that none of the accepted formats could parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to parse date `{0}`")]
pub struct InvalidDateError(pub String);

/// Lookup by identifier or scoping field found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No {entity} with that {field} was found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub field: &'static str,
}

/// A store call exceeded its time budget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store did not answer within {timeout_ms} ms")]
pub struct StoreUnavailableError {
    pub timeout_ms: u64,
}
