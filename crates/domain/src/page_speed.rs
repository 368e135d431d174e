//! Page speed report: daily PageSpeed Insights scores for one web page.
//!
//! The identity is derived from the page id and the calendar day of the
//! report, so saving twice on the same day overwrites the earlier record.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chart::{Cell, Chartable, Column};
use crate::document::Document;
use crate::error::{HomeMonitorError, ValidationError};
use crate::time::{Timestamp, chart_date, format_day_key, now};

/// Daily PageSpeed scores for a web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpeedReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "webPageUrlId")]
    pub web_page_url_id: String,
    #[serde(default)]
    pub url: Option<Url>,
    #[serde(default = "now", with = "crate::time::wire")]
    pub date: Timestamp,
    #[serde(rename = "pageSpeedMobileSpeed", default)]
    pub mobile_speed: i32,
    #[serde(rename = "pageSpeedMobileUX", default)]
    pub mobile_ux: i32,
    #[serde(rename = "pageSpeedDesktopSpeed", default)]
    pub desktop_speed: i32,
}

impl PageSpeedReport {
    pub const ID: &'static str = "id";
    pub const WEB_PAGE_URL_ID: &'static str = "webPageUrlId";
    pub const URL: &'static str = "url";
    pub const DATE: &'static str = "date";

    /// Fields the store should index for this collection.
    pub const INDEXED: [&'static str; 3] = [Self::WEB_PAGE_URL_ID, Self::URL, Self::DATE];

    /// Create a report dated now with its identity already derived.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when `web_page_url_id` is empty.
    pub fn new(
        web_page_url_id: impl Into<String>,
        url: Option<Url>,
        mobile_speed: i32,
        mobile_ux: i32,
        desktop_speed: i32,
    ) -> Result<Self, HomeMonitorError> {
        let mut report = Self {
            id: None,
            web_page_url_id: web_page_url_id.into(),
            url,
            date: now(),
            mobile_speed,
            mobile_ux,
            desktop_speed,
        };
        report.derive_id()?;
        Ok(report)
    }

    /// Recompute the identity as `<webPageUrlId>-<yyyyMMdd>`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::Validation`] when `web_page_url_id` is empty.
    pub fn derive_id(&mut self) -> Result<(), HomeMonitorError> {
        if self.web_page_url_id.trim().is_empty() {
            return Err(ValidationError::EmptyWebPageUrlId.into());
        }
        self.id = Some(format!(
            "{}-{}",
            self.web_page_url_id,
            format_day_key(&self.date)
        ));
        Ok(())
    }
}

impl Document for PageSpeedReport {
    type Id = String;

    const COLLECTION: &'static str = "PageSpeedReport";

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Chartable for PageSpeedReport {
    fn columns() -> Vec<Column> {
        vec![
            Column::date("Date"),
            Column::number("Desktop Speed"),
            Column::number("Mobile Speed"),
            Column::number("Mobile UX"),
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::new(chart_date(&self.date)),
            Cell::new(self.desktop_speed),
            Cell::new(self.mobile_speed),
            Cell::new(self.mobile_ux),
        ]
    }
}
