//! Device reports: time-series readings attached to a [`Device`](crate::device::Device).
//!
//! [`DeviceReport`] carries what every report has in common and is embedded
//! into each concrete report type.

use serde::{Deserialize, Serialize};

use crate::chart::{Cell, Chartable, Column};
use crate::document::Document;
use crate::id::{DeviceId, ReportId};
use crate::time::{Timestamp, chart_date_time, now};

/// Fields shared by every device report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReportId>,
    #[serde(rename = "deviceId")]
    pub device_id: DeviceId,
    #[serde(default = "now", with = "crate::time::wire")]
    pub date: Timestamp,
}

impl DeviceReport {
    pub const ID: &'static str = "id";
    pub const DEVICE_ID: &'static str = "deviceId";
    pub const DATE: &'static str = "date";

    /// Start a report for `device_id`, dated now.
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            id: None,
            device_id,
            date: now(),
        }
    }
}

/// A temperature and humidity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTemperatureHumidityReport {
    #[serde(flatten)]
    pub report: DeviceReport,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
}

impl DeviceTemperatureHumidityReport {
    /// Fields the store should index for this collection.
    pub const INDEXED: [&'static str; 2] = [DeviceReport::DEVICE_ID, DeviceReport::DATE];

    /// Create a reading for `device_id`, dated now.
    #[must_use]
    pub fn new(device_id: DeviceId, temperature: f64, humidity: f64) -> Self {
        Self {
            report: DeviceReport::new(device_id),
            temperature,
            humidity,
        }
    }

    /// Override the report date.
    #[must_use]
    pub fn at(mut self, date: Timestamp) -> Self {
        self.report.date = date;
        self
    }
}

impl Document for DeviceTemperatureHumidityReport {
    type Id = ReportId;

    const COLLECTION: &'static str = "DeviceTemperatureHumidityReport";

    fn id(&self) -> Option<ReportId> {
        self.report.id
    }

    fn set_id(&mut self, id: ReportId) {
        self.report.id = Some(id);
    }
}

impl Chartable for DeviceTemperatureHumidityReport {
    fn columns() -> Vec<Column> {
        vec![
            Column::date("Date"),
            Column::number("Temperature"),
            Column::number("Humidity"),
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::new(chart_date_time(&self.report.date)),
            Cell::new(self.temperature),
            Cell::new(self.humidity),
        ]
    }
}
