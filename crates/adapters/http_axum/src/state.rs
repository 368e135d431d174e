//! Shared application state for axum handlers.

use std::sync::Arc;

use homemonitor_app::ports::DocumentStore;
use homemonitor_app::services::{DeviceService, ReportService};

/// Application state shared across all axum handlers.
///
/// Generic over the document store to avoid dynamic dispatch. `Clone` is
/// implemented manually so the store itself does not need to be `Clone`.
pub struct AppState<S> {
    /// Device listing and writes.
    pub device_service: Arc<DeviceService<S>>,
    /// Temperature and page-speed report listing and writes.
    pub report_service: Arc<ReportService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
            report_service: Arc::clone(&self.report_service),
        }
    }
}

impl<S> AppState<S>
where
    S: DocumentStore + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(device_service: DeviceService<S>, report_service: ReportService<S>) -> Self {
        Self::from_arcs(Arc::new(device_service), Arc::new(report_service))
    }

    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// Use this when the services are also driven from outside the router,
    /// e.g. to warm caches at startup.
    pub fn from_arcs(
        device_service: Arc<DeviceService<S>>,
        report_service: Arc<ReportService<S>>,
    ) -> Self {
        Self {
            device_service,
            report_service,
        }
    }
}
