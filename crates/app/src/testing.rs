//! In-memory [`DocumentStore`] used by the service tests.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use homemonitor_domain::document::ID_FIELD;
use homemonitor_domain::error::HomeMonitorError;
use serde_json::Value;

use crate::ports::store::{DocumentStore, Filter, Query};

#[derive(Default)]
struct Inner {
    next_seq: i64,
    /// `(collection, id)` → `(seq, body)`
    docs: BTreeMap<(String, String), (i64, Value)>,
    indexes: Vec<(String, String)>,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
    delay: Option<Duration>,
}

impl InMemoryDocumentStore {
    /// A store whose every call sleeps for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn indexes(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().indexes.clone()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .docs
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    fn answer<R: Send + 'static>(
        &self,
        result: Result<R, HomeMonitorError>,
    ) -> impl Future<Output = Result<R, HomeMonitorError>> + Send + use<R> {
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn satisfies(body: &Value, filter: &Filter) -> bool {
    let Some(actual) = body.get(filter.field()) else {
        return false;
    };
    match filter {
        Filter::Eq { value, .. } => compare(actual, value) == Some(Ordering::Equal),
        Filter::In { values, .. } => values
            .iter()
            .any(|v| compare(actual, v) == Some(Ordering::Equal)),
        Filter::Gte { value, .. } => {
            matches!(compare(actual, value), Some(Ordering::Greater | Ordering::Equal))
        }
        Filter::Lte { value, .. } => {
            matches!(compare(actual, value), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> impl Future<Output = Result<Option<Value>, HomeMonitorError>> + Send {
        let inner = self.inner.lock().unwrap();
        let result = inner
            .docs
            .get(&(collection.to_string(), id))
            .map(|(_, body)| body.clone());
        self.answer(Ok(result))
    }

    fn find(
        &self,
        collection: &'static str,
        query: Query,
    ) -> impl Future<Output = Result<Vec<Value>, HomeMonitorError>> + Send {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<(i64, Value)> = inner
            .docs
            .iter()
            .filter(|((c, _), (_, body))| {
                c == collection && query.filters.iter().all(|f| satisfies(body, f))
            })
            .map(|(_, (seq, body))| (*seq, body.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        if let Some(order) = &query.order {
            rows.sort_by(|(_, a), (_, b)| {
                let ord = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                if order.descending { ord.reverse() } else { ord }
            });
        }
        let skip = usize::try_from(query.page.skip.unwrap_or(0)).unwrap();
        let limit = query
            .page
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap());
        let result = rows
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, body)| body)
            .collect();
        self.answer(Ok(result))
    }

    fn put(
        &self,
        collection: &'static str,
        documents: Vec<(Option<String>, Value)>,
    ) -> impl Future<Output = Result<Vec<String>, HomeMonitorError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        let mut ids = Vec::with_capacity(documents.len());
        for (id, mut body) in documents {
            inner.next_seq += 1;
            let seq = inner.next_seq;
            let id = match id {
                Some(id) => id,
                None => {
                    body[ID_FIELD] = Value::from(seq);
                    seq.to_string()
                }
            };
            let key = (collection.to_string(), id.clone());
            let seq = inner.docs.get(&key).map_or(seq, |(existing, _)| *existing);
            inner.docs.insert(key, (seq, body));
            ids.push(id);
        }
        self.answer(Ok(ids))
    }

    fn delete(
        &self,
        collection: &'static str,
        ids: Vec<String>,
    ) -> impl Future<Output = Result<u64, HomeMonitorError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        let mut removed = 0;
        for id in ids {
            if inner.docs.remove(&(collection.to_string(), id)).is_some() {
                removed += 1;
            }
        }
        self.answer(Ok(removed))
    }

    fn ensure_index(
        &self,
        collection: &'static str,
        field: String,
    ) -> impl Future<Output = Result<(), HomeMonitorError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        let entry = (collection.to_string(), field);
        if !inner.indexes.contains(&entry) {
            inner.indexes.push(entry);
        }
        self.answer(Ok(()))
    }
}
