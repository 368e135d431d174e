//! List cache: pre-serialized "list everything" responses, one slot per collection.
//!
//! A single async mutex guards every slot and stays held while a slot is
//! loaded, so a read that populates can never interleave with a write that
//! invalidates and repopulates.

use std::collections::HashMap;
use std::future::Future;

use homemonitor_domain::error::HomeMonitorError;
use tokio::sync::Mutex;

/// Cache of JSON listings keyed by collection name.
#[derive(Debug, Default)]
pub struct ListCache {
    slots: Mutex<HashMap<&'static str, String>>,
}

impl ListCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached listing for `collection`, loading it when the slot is empty.
    ///
    /// # Errors
    ///
    /// Propagates the error of `load`; the slot stays empty in that case.
    pub async fn get_or_populate<F, Fut>(
        &self,
        collection: &'static str,
        load: F,
    ) -> Result<String, HomeMonitorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, HomeMonitorError>>,
    {
        let mut slots = self.slots.lock().await;
        if let Some(listing) = slots.get(collection) {
            tracing::debug!(collection, "list cache hit");
            return Ok(listing.clone());
        }
        let listing = load().await?;
        slots.insert(collection, listing.clone());
        Ok(listing)
    }

    /// Drop the slot for `collection` and load it again.
    ///
    /// A failing `load` is logged and leaves the slot empty so the next read
    /// retries.
    pub async fn refresh<F, Fut>(&self, collection: &'static str, load: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, HomeMonitorError>>,
    {
        let mut slots = self.slots.lock().await;
        slots.remove(collection);
        match load().await {
            Ok(listing) => {
                slots.insert(collection, listing);
            }
            Err(err) => {
                tracing::warn!(collection, error = %err, "failed to repopulate list cache");
            }
        }
    }

    /// Current content of the slot, without loading.
    pub async fn peek(&self, collection: &'static str) -> Option<String> {
        self.slots.lock().await.get(collection).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homemonitor_domain::error::StoreUnavailableError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unavailable() -> HomeMonitorError {
        StoreUnavailableError { timeout_ms: 1 }.into()
    }

    #[tokio::test]
    async fn should_load_once_when_slot_is_populated() {
        let cache = ListCache::new();
        let loads = AtomicUsize::new(0);
        for _ in 0..3 {
            let listing = cache
                .get_or_populate("Device", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok("[]".to_string())
                })
                .await
                .unwrap();
            assert_eq!(listing, "[]");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_replace_listing_when_refreshed() {
        let cache = ListCache::new();
        cache
            .get_or_populate("Device", || async { Ok("[1]".to_string()) })
            .await
            .unwrap();
        cache
            .refresh("Device", || async { Ok("[1,2]".to_string()) })
            .await;
        assert_eq!(cache.peek("Device").await.as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn should_leave_slot_empty_when_refresh_fails() {
        let cache = ListCache::new();
        cache
            .get_or_populate("Device", || async { Ok("[1]".to_string()) })
            .await
            .unwrap();
        cache.refresh("Device", || async { Err(unavailable()) }).await;
        assert!(cache.peek("Device").await.is_none());

        let listing = cache
            .get_or_populate("Device", || async { Ok("[3]".to_string()) })
            .await
            .unwrap();
        assert_eq!(listing, "[3]");
    }

    #[tokio::test]
    async fn should_propagate_error_when_first_load_fails() {
        let cache = ListCache::new();
        let result = cache
            .get_or_populate("Device", || async { Err(unavailable()) })
            .await;
        assert!(matches!(result, Err(HomeMonitorError::StoreUnavailable(_))));
        assert!(cache.peek("Device").await.is_none());
    }

    #[tokio::test]
    async fn should_keep_slots_independent_per_collection() {
        let cache = ListCache::new();
        cache
            .get_or_populate("Device", || async { Ok("[\"d\"]".to_string()) })
            .await
            .unwrap();
        cache
            .refresh("PageSpeedReport", || async { Ok("[\"p\"]".to_string()) })
            .await;
        assert_eq!(cache.peek("Device").await.as_deref(), Some("[\"d\"]"));
        assert_eq!(
            cache.peek("PageSpeedReport").await.as_deref(),
            Some("[\"p\"]")
        );
    }

    #[tokio::test]
    async fn should_serialize_concurrent_refreshes() {
        let cache = Arc::new(ListCache::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .refresh("Device", || async move { Ok(format!("[{i}]")) })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let listing = cache.peek("Device").await.unwrap();
        assert!(listing.starts_with('[') && listing.ends_with(']'));
    }
}
