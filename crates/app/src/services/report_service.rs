//! Report service: use-cases for device readings and page speed reports.

use homemonitor_domain::document::Document;
use homemonitor_domain::error::{HomeMonitorError, NotFoundError};
use homemonitor_domain::id::{DeviceId, ReportId};
use homemonitor_domain::page_speed::PageSpeedReport;
use homemonitor_domain::report::{DeviceReport, DeviceTemperatureHumidityReport};
use homemonitor_domain::time::Timestamp;
use serde_json::Value;

use crate::ports::{DocumentStore, Page};
use crate::services::persister::EntityPersister;

/// Parameters of a temperature report list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemperatureQuery {
    pub id: Option<ReportId>,
    pub device_id: Option<DeviceId>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub page: Page,
}

/// Parameters of a page speed report list request.
///
/// `url` must already be in its normalized serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSpeedQuery {
    pub id: Option<String>,
    pub web_page_url_id: Option<String>,
    pub url: Option<String>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub page: Page,
}

/// Application service for both report families.
pub struct ReportService<S> {
    persister: EntityPersister<S>,
}

fn not_found(entity: &'static str, field: &'static str) -> HomeMonitorError {
    NotFoundError { entity, field }.into()
}

impl<S: DocumentStore> ReportService<S> {
    /// Create a new service backed by the given persister.
    pub fn new(persister: EntityPersister<S>) -> Self {
        Self { persister }
    }

    /// Declare the indexes queried by this service.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn declare_indexes(&self) -> Result<(), HomeMonitorError> {
        self.persister
            .declare_indexes::<DeviceTemperatureHumidityReport>(
                &DeviceTemperatureHumidityReport::INDEXED,
            )
            .await?;
        self.persister
            .declare_indexes::<PageSpeedReport>(&PageSpeedReport::INDEXED)
            .await
    }

    async fn scoped<T: Document>(
        &self,
        entity: &'static str,
        field: &'static str,
        value: Value,
        date_field: &'static str,
        (start, end, page): (Option<Timestamp>, Option<Timestamp>, Page),
    ) -> Result<Vec<T>, HomeMonitorError> {
        let reports = self
            .persister
            .get_by_field_and_date_range(Some((field, value)), Some(date_field), start, end, page)
            .await?;
        if reports.is_empty() {
            return Err(not_found(entity, field));
        }
        Ok(reports)
    }

    /// Temperature reports matching the request.
    ///
    /// Dispatch order: `id`, then `device_id` within the date window (newest
    /// first), then every report.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when the identifying parameter
    /// matches nothing, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn list_temperature(
        &self,
        query: TemperatureQuery,
    ) -> Result<Vec<DeviceTemperatureHumidityReport>, HomeMonitorError> {
        const ENTITY: &str = DeviceTemperatureHumidityReport::COLLECTION;
        if let Some(id) = query.id {
            tracing::info!("getting temperature report by id");
            let report = self
                .persister
                .get_by_id::<DeviceTemperatureHumidityReport>(&id)
                .await?;
            return report
                .map(|r| vec![r])
                .ok_or_else(|| not_found(ENTITY, DeviceReport::ID));
        }
        if let Some(device_id) = query.device_id {
            tracing::info!("getting temperature reports by device id");
            return self
                .scoped(
                    ENTITY,
                    DeviceReport::DEVICE_ID,
                    Value::from(device_id.value()),
                    DeviceReport::DATE,
                    (query.start, query.end, query.page),
                )
                .await;
        }
        tracing::info!("getting all temperature reports");
        self.persister.get_all().await
    }

    /// Save one temperature report, returning it as stored.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    #[tracing::instrument(skip_all, fields(device_id = %report.report.device_id))]
    pub async fn save_temperature(
        &self,
        report: DeviceTemperatureHumidityReport,
    ) -> Result<DeviceTemperatureHumidityReport, HomeMonitorError> {
        tracing::info!("persisting temperature report");
        self.persister.save(report).await
    }

    /// Save several temperature reports at once.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn save_temperatures(
        &self,
        reports: Vec<DeviceTemperatureHumidityReport>,
    ) -> Result<(), HomeMonitorError> {
        tracing::info!(count = reports.len(), "persisting a list of temperature reports");
        self.persister.save_all(reports).await
    }

    /// Delete a temperature report by id.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when no report with `id` exists,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_temperature(&self, id: ReportId) -> Result<(), HomeMonitorError> {
        let report: DeviceTemperatureHumidityReport = self
            .persister
            .get_by_id(&id)
            .await?
            .ok_or_else(|| {
                not_found(DeviceTemperatureHumidityReport::COLLECTION, DeviceReport::ID)
            })?;
        self.persister.remove(&report).await?;
        Ok(())
    }

    /// Page speed reports matching the request.
    ///
    /// Dispatch order: `id`, then `web_page_url_id`, then `url` (both within
    /// the date window, newest first), then every report.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when the identifying parameter
    /// matches nothing, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn list_page_speed(
        &self,
        query: PageSpeedQuery,
    ) -> Result<Vec<PageSpeedReport>, HomeMonitorError> {
        const ENTITY: &str = PageSpeedReport::COLLECTION;
        let window = (query.start, query.end, query.page);
        if let Some(id) = query.id {
            tracing::info!("getting page speed report by id");
            let report = self.persister.get_by_id::<PageSpeedReport>(&id).await?;
            return report
                .map(|r| vec![r])
                .ok_or_else(|| not_found(ENTITY, PageSpeedReport::ID));
        }
        if let Some(web_page_url_id) = query.web_page_url_id {
            tracing::info!("getting page speed reports by web page url id");
            return self
                .scoped(
                    ENTITY,
                    PageSpeedReport::WEB_PAGE_URL_ID,
                    Value::from(web_page_url_id),
                    PageSpeedReport::DATE,
                    window,
                )
                .await;
        }
        if let Some(url) = query.url {
            tracing::info!("getting page speed reports by url");
            return self
                .scoped(
                    ENTITY,
                    PageSpeedReport::URL,
                    Value::from(url),
                    PageSpeedReport::DATE,
                    window,
                )
                .await;
        }
        tracing::info!("getting all page speed reports");
        self.persister.get_all().await
    }

    /// Derive the identity of `report` and save it, returning it as stored.
    ///
    /// A report for the same page on the same day replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when `webPageUrlId` is empty,
    /// or a storage error.
    #[tracing::instrument(skip_all, fields(web_page_url_id = %report.web_page_url_id))]
    pub async fn save_page_speed(
        &self,
        mut report: PageSpeedReport,
    ) -> Result<PageSpeedReport, HomeMonitorError> {
        report.derive_id()?;
        tracing::info!("persisting page speed report");
        self.persister.save(report).await
    }

    /// Derive identities and save several page speed reports at once.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when any `webPageUrlId` is
    /// empty (nothing is saved then), or a storage error.
    pub async fn save_page_speeds(
        &self,
        mut reports: Vec<PageSpeedReport>,
    ) -> Result<(), HomeMonitorError> {
        for report in &mut reports {
            report.derive_id()?;
        }
        tracing::info!(count = reports.len(), "persisting a list of page speed reports");
        self.persister.save_all(reports).await
    }

    /// Delete a page speed report by id.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when no report with `id` exists,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_page_speed(&self, id: String) -> Result<(), HomeMonitorError> {
        let report: PageSpeedReport = self
            .persister
            .get_by_id(&id)
            .await?
            .ok_or_else(|| not_found(PageSpeedReport::COLLECTION, PageSpeedReport::ID))?;
        self.persister.remove(&report).await?;
        Ok(())
    }

    /// Delete every report of one web page, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::NotFound`] when the page has no report, or
    /// a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_page_speed_by_page(
        &self,
        web_page_url_id: String,
    ) -> Result<u64, HomeMonitorError> {
        let removed = self
            .persister
            .remove_by_field::<PageSpeedReport>(
                PageSpeedReport::WEB_PAGE_URL_ID,
                Value::from(web_page_url_id),
            )
            .await?;
        if removed == 0 {
            return Err(not_found(
                PageSpeedReport::COLLECTION,
                PageSpeedReport::WEB_PAGE_URL_ID,
            ));
        }
        Ok(removed)
    }
}
