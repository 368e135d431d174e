//! Document store port: schema-less persistence of JSON documents.
//!
//! A store keeps documents grouped by collection name and addressed by the
//! textual form of their identity. Queries filter on top-level JSON fields and
//! return bodies in a stable order: insertion order unless [`Query::order`]
//! says otherwise.

use std::future::Future;
use std::sync::Arc;

use homemonitor_domain::error::HomeMonitorError;
use serde_json::Value;

/// Predicate on one top-level field of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field == value`
    Eq { field: String, value: Value },
    /// `field` is one of `values`. An empty list matches nothing.
    In { field: String, values: Vec<Value> },
    /// `field >= value`
    Gte { field: String, value: Value },
    /// `field <= value`
    Lte { field: String, value: Value },
}

impl Filter {
    /// Name of the field this predicate reads.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. }
            | Self::In { field, .. }
            | Self::Gte { field, .. }
            | Self::Lte { field, .. } => field,
        }
    }
}

/// Sort key of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

/// Offset and size of a result window.
///
/// Non-positive values mean "no offset" and "unbounded".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl Page {
    /// The whole result set.
    pub const ALL: Self = Self {
        skip: None,
        limit: None,
    };

    /// Build a window from raw request values.
    #[must_use]
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        let positive = |v: Option<i64>| v.and_then(|v| u64::try_from(v).ok()).filter(|v| *v > 0);
        Self {
            skip: positive(skip),
            limit: positive(limit),
        }
    }
}

/// Conjunction of filters plus ordering and a result window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub page: Page,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order = Some(Order {
            field: field.into(),
            descending,
        });
        self
    }

    #[must_use]
    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}

/// Persistence of JSON documents grouped in collections.
///
/// The identity of a document is stored both as its address and under the
/// `id` field of its body.
pub trait DocumentStore: Send + Sync {
    /// Fetch one document body by identity.
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> impl Future<Output = Result<Option<Value>, HomeMonitorError>> + Send;

    /// Fetch every document body matching `query`.
    fn find(
        &self,
        collection: &'static str,
        query: Query,
    ) -> impl Future<Output = Result<Vec<Value>, HomeMonitorError>> + Send;

    /// Insert or replace documents, returning the identity of each.
    ///
    /// An entry without identity gets one allocated by the store, written
    /// back into its body. The batch is applied atomically.
    fn put(
        &self,
        collection: &'static str,
        documents: Vec<(Option<String>, Value)>,
    ) -> impl Future<Output = Result<Vec<String>, HomeMonitorError>> + Send;

    /// Delete documents by identity, returning how many existed.
    fn delete(
        &self,
        collection: &'static str,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<u64, HomeMonitorError>> + Send;

    /// Hint that `field` is queried often. Idempotent.
    fn ensure_index(
        &self,
        collection: &'static str,
        field: String,
    ) -> impl Future<Output = Result<(), HomeMonitorError>> + Send;
}

impl<T: DocumentStore> DocumentStore for Arc<T> {
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> impl Future<Output = Result<Option<Value>, HomeMonitorError>> + Send {
        (**self).get(collection, id)
    }

    fn find(
        &self,
        collection: &'static str,
        query: Query,
    ) -> impl Future<Output = Result<Vec<Value>, HomeMonitorError>> + Send {
        (**self).find(collection, query)
    }

    fn put(
        &self,
        collection: &'static str,
        documents: Vec<(Option<String>, Value)>,
    ) -> impl Future<Output = Result<Vec<String>, HomeMonitorError>> + Send {
        (**self).put(collection, documents)
    }

    fn delete(
        &self,
        collection: &'static str,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<u64, HomeMonitorError>> + Send {
        (**self).delete(collection, ids)
    }

    fn ensure_index(
        &self,
        collection: &'static str,
        field: String,
    ) -> impl Future<Output = Result<(), HomeMonitorError>> + Send {
        (**self).ensure_index(collection, field)
    }
}
