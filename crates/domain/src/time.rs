//! Time and timestamp helpers.
//!
//! Timestamps travel as `yyyy-MM-ddTHH:mm:ssZ` in UTC. Keeping a single,
//! fixed-width, second-precision text form means stored timestamps compare
//! the same way as text and as instants.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, SubsecRound, Timelike, Utc};

use crate::error::InvalidDateError;

/// UTC timestamp used for `created`, `updated` and report dates.
pub type Timestamp = DateTime<Utc>;

/// Wire format of every serialized timestamp.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Day key format used by derived identities.
pub const DAY_KEY_FORMAT: &str = "%Y%m%d";

/// Hour of the day that date-only inputs are anchored to.
const DATE_ANCHOR_HOUR: u32 = 12;

/// Return the current UTC time, truncated to whole seconds.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(0)
}

/// Format a timestamp in the wire format.
#[must_use]
pub fn format_wire(ts: &Timestamp) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

/// Format the calendar day of a timestamp as `yyyyMMdd`.
#[must_use]
pub fn format_day_key(ts: &Timestamp) -> String {
    ts.format(DAY_KEY_FORMAT).to_string()
}

/// Parse a request date.
///
/// Accepted inputs, tried in order: a full RFC 3339 timestamp, `yyyy-MM-dd`,
/// `yyyy-MM` (first day of the month) and `yyyyMMdd`. Date-only inputs are
/// anchored at noon UTC.
///
/// # Errors
///
/// Returns [`InvalidDateError`] when no format matches.
pub fn parse_date(value: &str) -> Result<Timestamp, InvalidDateError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.to_utc().trunc_subsecs(0));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(value, DAY_KEY_FORMAT))
        .map(anchor)
        .map_err(|_| InvalidDateError(value.to_owned()))
}

fn anchor(date: NaiveDate) -> Timestamp {
    let noon = NaiveTime::from_hms_opt(DATE_ANCHOR_HOUR, 0, 0).unwrap_or_default();
    date.and_time(noon).and_utc()
}

/// Render a day as a JavaScript `Date(y,m,d)` literal (zero-based month).
#[must_use]
pub fn chart_date(ts: &Timestamp) -> String {
    format!("Date({},{},{})", ts.year(), ts.month0(), ts.day())
}

/// Render an instant as a JavaScript `Date(y,m,d,h,mi,s,ms)` literal.
#[must_use]
pub fn chart_date_time(ts: &Timestamp) -> String {
    format!(
        "Date({},{},{},{},{},{},{})",
        ts.year(),
        ts.month0(),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        ts.timestamp_subsec_millis()
    )
}

/// Serde adapter for timestamps in the wire format.
pub mod wire {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Timestamp, format_wire, parse_date};

    /// Serialize a timestamp as `yyyy-MM-ddTHH:mm:ssZ`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_wire(ts))
    }

    /// Deserialize a timestamp from any accepted date format.
    ///
    /// # Errors
    ///
    /// Fails when the text matches no accepted format.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_date(&text).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional timestamps.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::{Timestamp, format_wire, parse_date};

        /// Serialize an optional timestamp, `null` when absent.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_str(&format_wire(ts)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize an optional timestamp.
        ///
        /// # Errors
        ///
        /// Fails when present text matches no accepted format.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| parse_date(&text).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
