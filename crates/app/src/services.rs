//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod device_service;
pub mod persister;
pub mod report_service;

pub use device_service::{DeviceQuery, DeviceService};
pub use persister::EntityPersister;
pub use report_service::{PageSpeedQuery, ReportService, TemperatureQuery};

/// Result of a list request.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    /// Pre-serialized JSON array served from the [`ListCache`](crate::list_cache::ListCache).
    Cached(String),
    /// Records fetched for this request, in store order.
    Items(Vec<T>),
}
