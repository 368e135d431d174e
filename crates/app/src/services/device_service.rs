//! Device service: use-cases for listing and managing devices.
//!
//! The full device listing is served from the [`ListCache`] and refreshed
//! after every write.

use std::sync::Arc;

use homemonitor_domain::device::Device;
use homemonitor_domain::document::Document;
use homemonitor_domain::error::{HomeMonitorError, NotFoundError};
use homemonitor_domain::id::DeviceId;
use homemonitor_domain::time::now;
use serde_json::Value;

use crate::list_cache::ListCache;
use crate::ports::DocumentStore;
use crate::services::Listing;
use crate::services::persister::EntityPersister;

/// Identifying parameters of a device list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceQuery {
    pub id: Option<DeviceId>,
    pub owner: Option<String>,
}

/// Application service for device operations.
pub struct DeviceService<S> {
    persister: EntityPersister<S>,
    cache: Arc<ListCache>,
}

impl<S: DocumentStore> DeviceService<S> {
    /// Create a new service backed by the given persister and cache.
    pub fn new(persister: EntityPersister<S>, cache: Arc<ListCache>) -> Self {
        Self { persister, cache }
    }

    /// Declare the indexes queried by this service.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn declare_indexes(&self) -> Result<(), HomeMonitorError> {
        self.persister
            .declare_indexes::<Device>(&Device::INDEXED)
            .await
    }

    async fn render_all(&self) -> Result<String, HomeMonitorError> {
        let devices: Vec<Device> = self.persister.get_all().await?;
        serde_json::to_string(&devices).map_err(|err| HomeMonitorError::Storage(Box::new(err)))
    }

    /// Load the full listing into the cache.
    pub async fn warm_cache(&self) {
        self.cache
            .refresh(Device::COLLECTION, || self.render_all())
            .await;
    }

    /// Devices matching the request.
    ///
    /// Dispatch order: `id`, then `owner`, then the cached full listing.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when `id` matches nothing or
    /// `owner` owns nothing, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: DeviceQuery) -> Result<Listing<Device>, HomeMonitorError> {
        if let Some(id) = query.id {
            tracing::info!("getting device by id");
            let device = self.get(id).await?;
            return Ok(Listing::Items(vec![device]));
        }
        if let Some(owner) = query.owner {
            tracing::info!("getting devices by owner");
            let devices: Vec<Device> = self
                .persister
                .get_by_field(Device::OWNER, Value::from(owner))
                .await?;
            if devices.is_empty() {
                return Err(NotFoundError {
                    entity: "Device",
                    field: Device::OWNER,
                }
                .into());
            }
            return Ok(Listing::Items(devices));
        }
        tracing::info!("getting all devices");
        let listing = self
            .cache
            .get_or_populate(Device::COLLECTION, || self.render_all())
            .await?;
        Ok(Listing::Cached(listing))
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when no device with `id` exists,
    /// or a storage error.
    pub async fn get(&self, id: DeviceId) -> Result<Device, HomeMonitorError> {
        self.persister.get_by_id(&id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                field: Device::ID,
            }
            .into()
        })
    }

    /// Validate, stamp and save one device, returning it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] if invariants fail, or a
    /// storage error.
    #[tracing::instrument(skip(self, device), fields(owner = %device.owner))]
    pub async fn save(&self, mut device: Device) -> Result<Device, HomeMonitorError> {
        device.validate()?;
        device.stamp(now());
        tracing::info!("persisting device");
        let saved = self.persister.save(device).await?;
        self.warm_cache().await;
        Ok(saved)
    }

    /// Validate, stamp and save several devices at once.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] if any device fails its
    /// invariants (nothing is saved then), or a storage error.
    #[tracing::instrument(skip_all, fields(count = devices.len()))]
    pub async fn save_all(&self, mut devices: Vec<Device>) -> Result<(), HomeMonitorError> {
        let stamp = now();
        for device in &mut devices {
            device.validate()?;
            device.stamp(stamp);
        }
        tracing::info!("persisting a list of devices");
        self.persister.save_all(devices).await?;
        self.warm_cache().await;
        Ok(())
    }

    /// Delete a device by id.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when no device with `id` exists,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: DeviceId) -> Result<(), HomeMonitorError> {
        let device = self.get(id).await?;
        tracing::info!("deleting device");
        self.persister.remove(&device).await?;
        self.warm_cache().await;
        Ok(())
    }
}
