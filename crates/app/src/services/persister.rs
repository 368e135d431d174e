//! Entity persister: typed get/save/remove/query operations over a [`DocumentStore`].
//!
//! Every store call is bounded by a timeout. A call that does not answer in
//! time fails with [`HomeMonitorError::StoreUnavailable`]; nothing is retried.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use homemonitor_domain::document::{Document, DocumentKey, ID_FIELD, is_valid_field_name};
use homemonitor_domain::error::{
    HomeMonitorError, NotFoundError, StoreUnavailableError, ValidationError,
};
use homemonitor_domain::time::{Timestamp, format_wire};
use serde_json::Value;

use crate::ports::store::{DocumentStore, Filter, Page, Query};

/// Time budget of a single store call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Generic persistence facade for every [`Document`] type.
#[derive(Debug, Clone)]
pub struct EntityPersister<S> {
    store: S,
    timeout: Duration,
}

fn storage_error(err: impl std::error::Error + Send + Sync + 'static) -> HomeMonitorError {
    HomeMonitorError::Storage(Box::new(err))
}

fn check_field(field: &str) -> Result<(), HomeMonitorError> {
    if is_valid_field_name(field) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFieldName(field.to_owned()).into())
    }
}

fn decode<T: Document>(body: Value) -> Result<T, HomeMonitorError> {
    serde_json::from_value(body).map_err(storage_error)
}

fn encode<T: Document>(entity: &T) -> Result<(Option<String>, Value), HomeMonitorError> {
    let id = match entity.id() {
        Some(id) => Some(id.to_string()),
        None if T::Id::STORE_ASSIGNED => None,
        None => {
            return Err(ValidationError::MissingId {
                collection: T::COLLECTION,
            }
            .into());
        }
    };
    let body = serde_json::to_value(entity).map_err(storage_error)?;
    Ok((id, body))
}

impl<S: DocumentStore> EntityPersister<S> {
    /// Create a persister with the [`DEFAULT_TIMEOUT`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the time budget of each store call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call<R>(
        &self,
        fut: impl Future<Output = Result<R, HomeMonitorError>>,
    ) -> Result<R, HomeMonitorError> {
        if let Ok(result) = tokio::time::timeout(self.timeout, fut).await {
            result
        } else {
            let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(timeout_ms, "store call timed out");
            Err(StoreUnavailableError { timeout_ms }.into())
        }
    }

    async fn find<T: Document>(&self, query: Query) -> Result<Vec<T>, HomeMonitorError> {
        for filter in &query.filters {
            check_field(filter.field())?;
        }
        if let Some(order) = &query.order {
            check_field(&order.field)?;
        }
        let bodies = self.call(self.store.find(T::COLLECTION, query)).await?;
        bodies.into_iter().map(decode).collect()
    }

    /// Every document of type `T`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a store error or [`HomeMonitorError::StoreUnavailable`].
    pub async fn get_all<T: Document>(&self) -> Result<Vec<T>, HomeMonitorError> {
        self.find(Query::new()).await
    }

    /// A window of [`EntityPersister::get_all`].
    ///
    /// # Errors
    ///
    /// Returns a store error or [`HomeMonitorError::StoreUnavailable`].
    pub async fn get_page<T: Document>(&self, page: Page) -> Result<Vec<T>, HomeMonitorError> {
        self.find(Query::new().page(page)).await
    }

    /// Look up a document by identity. A missing document is `None`.
    ///
    /// # Errors
    ///
    /// Returns a store error or [`HomeMonitorError::StoreUnavailable`].
    #[tracing::instrument(skip(self, id), fields(collection = T::COLLECTION, id = %id))]
    pub async fn get_by_id<T: Document>(&self, id: &T::Id) -> Result<Option<T>, HomeMonitorError> {
        self.call(self.store.get(T::COLLECTION, id.to_string()))
            .await?
            .map(decode)
            .transpose()
    }

    /// Documents whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn get_by_field<T: Document>(
        &self,
        field: &str,
        value: Value,
    ) -> Result<Vec<T>, HomeMonitorError> {
        self.get_by_field_paged(field, value, Page::ALL).await
    }

    /// A window of [`EntityPersister::get_by_field`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn get_by_field_paged<T: Document>(
        &self,
        field: &str,
        value: Value,
        page: Page,
    ) -> Result<Vec<T>, HomeMonitorError> {
        let query = Query::new()
            .filter(Filter::Eq {
                field: field.to_owned(),
                value,
            })
            .page(page);
        self.find(query).await
    }

    /// Documents whose `field` is one of `values`. An empty list matches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn get_by_field_in<T: Document>(
        &self,
        field: &str,
        values: Vec<Value>,
    ) -> Result<Vec<T>, HomeMonitorError> {
        check_field(field)?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        self.find(Query::new().filter(Filter::In {
            field: field.to_owned(),
            values,
        }))
        .await
    }

    /// Documents matching every `field == value` pair.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn get_by_fields<T: Document>(
        &self,
        fields: BTreeMap<String, Value>,
        page: Page,
    ) -> Result<Vec<T>, HomeMonitorError> {
        let query = fields
            .into_iter()
            .fold(Query::new().page(page), |query, (field, value)| {
                query.filter(Filter::Eq { field, value })
            });
        self.find(query).await
    }

    /// Documents filtered by an optional field and an optional date window.
    ///
    /// With a `date_field`, results are ordered by it, newest first, and:
    /// - `start` alone selects documents dated exactly `start`;
    /// - `start` and `end` select `start <= date <= end`;
    /// - otherwise no date predicate applies.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    #[tracing::instrument(skip(self, field), fields(collection = T::COLLECTION))]
    pub async fn get_by_field_and_date_range<T: Document>(
        &self,
        field: Option<(&str, Value)>,
        date_field: Option<&str>,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        page: Page,
    ) -> Result<Vec<T>, HomeMonitorError> {
        let mut query = Query::new().page(page);
        if let Some((field, value)) = field {
            query = query.filter(Filter::Eq {
                field: field.to_owned(),
                value,
            });
        }
        if let Some(date_field) = date_field {
            query = query.order_by(date_field, true);
            match (start, end) {
                (Some(start), None) => {
                    query = query.filter(Filter::Eq {
                        field: date_field.to_owned(),
                        value: Value::from(format_wire(&start)),
                    });
                }
                (Some(start), Some(end)) => {
                    query = query
                        .filter(Filter::Gte {
                            field: date_field.to_owned(),
                            value: Value::from(format_wire(&start)),
                        })
                        .filter(Filter::Lte {
                            field: date_field.to_owned(),
                            value: Value::from(format_wire(&end)),
                        });
                }
                (None, _) => {}
            }
        }
        self.find(query).await
    }

    /// Store-assigned identities can only address documents the store already
    /// handed out.
    async fn check_assigned<T: Document>(&self, entities: &[T]) -> Result<(), HomeMonitorError> {
        if !T::Id::STORE_ASSIGNED {
            return Ok(());
        }
        for id in entities.iter().filter_map(Document::id) {
            let id = id.to_string();
            if self.call(self.store.get(T::COLLECTION, id.clone())).await?.is_none() {
                tracing::warn!(collection = T::COLLECTION, %id, "unknown identity on save");
                return Err(NotFoundError {
                    entity: T::COLLECTION,
                    field: ID_FIELD,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Write `entity`, then read it back so store-assigned fields are reflected.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when a non store-assigned
    /// identity is missing, [`HomeMonitorError::NotFound`] when a
    /// store-assigned identity was never handed out, or a store error.
    #[tracing::instrument(skip_all, fields(collection = T::COLLECTION))]
    pub async fn save<T: Document>(&self, entity: T) -> Result<T, HomeMonitorError> {
        let document = encode(&entity)?;
        self.check_assigned(std::slice::from_ref(&entity)).await?;
        let ids = self.call(self.store.put(T::COLLECTION, vec![document])).await?;
        let id = ids
            .into_iter()
            .next()
            .ok_or_else(|| HomeMonitorError::Storage("store returned no identity".into()))?;
        let stored = self.call(self.store.get(T::COLLECTION, id.clone())).await?;
        let Some(body) = stored else {
            return Err(HomeMonitorError::Storage(
                format!("{} `{id}` missing right after save", T::COLLECTION).into(),
            ));
        };
        decode(body)
    }

    /// Write every entity in one batch. Empty input is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when a non store-assigned
    /// identity is missing, [`HomeMonitorError::NotFound`] when a
    /// store-assigned identity was never handed out (nothing is saved then),
    /// or a store error.
    #[tracing::instrument(skip_all, fields(collection = T::COLLECTION, count = entities.len()))]
    pub async fn save_all<T: Document>(&self, entities: Vec<T>) -> Result<(), HomeMonitorError> {
        if entities.is_empty() {
            return Ok(());
        }
        let documents = entities
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>, _>>()?;
        self.check_assigned(&entities).await?;
        self.call(self.store.put(T::COLLECTION, documents)).await?;
        Ok(())
    }

    /// Delete `entity`. An entity that was never saved is ignored.
    ///
    /// # Errors
    ///
    /// Returns a store error or [`HomeMonitorError::StoreUnavailable`].
    pub async fn remove<T: Document>(&self, entity: &T) -> Result<u64, HomeMonitorError> {
        self.remove_all(std::slice::from_ref(entity)).await
    }

    /// Delete every entity in `entities`. Empty input is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a store error or [`HomeMonitorError::StoreUnavailable`].
    #[tracing::instrument(skip_all, fields(collection = T::COLLECTION, count = entities.len()))]
    pub async fn remove_all<T: Document>(&self, entities: &[T]) -> Result<u64, HomeMonitorError> {
        let ids: Vec<String> = entities
            .iter()
            .filter_map(Document::id)
            .map(|id| id.to_string())
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }
        self.call(self.store.delete(T::COLLECTION, ids)).await
    }

    /// Delete every document whose `field` equals `value`.
    ///
    /// Matching documents are fetched first and deleted in a second call; a
    /// document written in between is not removed.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn remove_by_field<T: Document>(
        &self,
        field: &str,
        value: Value,
    ) -> Result<u64, HomeMonitorError> {
        let matching: Vec<T> = self.get_by_field(field, value).await?;
        self.remove_all(&matching).await
    }

    /// Delete every document whose `field` is one of `values`.
    ///
    /// Same two-phase behavior as [`EntityPersister::remove_by_field`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn remove_by_field_in<T: Document>(
        &self,
        field: &str,
        values: Vec<Value>,
    ) -> Result<u64, HomeMonitorError> {
        let matching: Vec<T> = self.get_by_field_in(field, values).await?;
        self.remove_all(&matching).await
    }

    /// Ask the store to index `field` of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] for an invalid field name, or a
    /// store error.
    pub async fn declare_index<T: Document>(&self, field: &str) -> Result<(), HomeMonitorError> {
        check_field(field)?;
        self.call(self.store.ensure_index(T::COLLECTION, field.to_owned()))
            .await
    }

    /// [`EntityPersister::declare_index`] for each of `fields`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing field.
    pub async fn declare_indexes<T: Document>(
        &self,
        fields: &[&str],
    ) -> Result<(), HomeMonitorError> {
        for field in fields {
            self.declare_index::<T>(field).await?;
        }
        tracing::debug!(collection = T::COLLECTION, ?fields, "indexes declared");
        Ok(())
    }
}
