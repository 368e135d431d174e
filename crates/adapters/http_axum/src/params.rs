//! Request parameter extraction.
//!
//! A parameter is looked up in the matched path first and in the query
//! string second; the first query value wins when a name repeats.

use axum::extract::{FromRequestParts, Query, RawPathParams};
use axum::http::request::Parts;
use url::Url;

use homemonitor_app::ports::Page;
use homemonitor_domain::error::HomeMonitorError;
use homemonitor_domain::time::{Timestamp, parse_date};

use crate::error::ApiError;

/// Query string parameter holding the number of records to skip.
pub const NUM_TO_SKIP: &str = "numToSkip";
/// Query string parameter holding the page size.
pub const LIMIT: &str = "limit";
/// Query string parameter holding the lower date bound.
pub const DATE_START: &str = "dateStart";
/// Query string parameter holding the upper date bound.
pub const DATE_END: &str = "dateEnd";
/// Query string parameter switching the response to chart shape.
pub const GRAPH: &str = "graph";

/// Path and query parameters of one request.
#[derive(Debug, Default, Clone)]
pub struct RequestParams {
    path: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path = match RawPathParams::from_request_parts(parts, state).await {
            Ok(params) => params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            Err(rejection) => return Err(ApiError::invalid(rejection.body_text())),
        };
        let Query(query) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid(rejection.body_text()))?;
        Ok(Self { path, query })
    }
}

impl RequestParams {
    /// Build parameters from explicit pairs.
    #[must_use]
    pub fn from_pairs(path: &[(&str, &str)], query: &[(&str, &str)]) -> Self {
        let own = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect()
        };
        Self {
            path: own(path),
            query: own(query),
        }
    }

    /// Raw value of `name`, path before query.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .chain(&self.query)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Non-empty text value of `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    }

    /// Integer value of `name`.
    ///
    /// Every character other than a digit or `.` is dropped before parsing,
    /// so `id=#42` reads as `42`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] when the remaining digits do
    /// not form an integer.
    pub fn integer(&self, name: &str) -> Result<Option<i64>, ApiError> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        let digits: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if digits.is_empty() {
            return Ok(None);
        }
        digits
            .parse()
            .map(Some)
            .map_err(|_| ApiError::invalid(format!("`{name}` must be an integer, got `{raw}`")))
    }

    /// `true` only when `name` is exactly `"true"`.
    #[must_use]
    pub fn boolean(&self, name: &str) -> bool {
        self.raw(name) == Some("true")
    }

    /// Date value of `name`. An empty value reads as absent.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::InvalidDate`] when no accepted format
    /// matches.
    pub fn date(&self, name: &str) -> Result<Option<Timestamp>, ApiError> {
        match self.raw(name).filter(|value| !value.is_empty()) {
            None => Ok(None),
            Some(raw) => parse_date(raw)
                .map(Some)
                .map_err(|err| HomeMonitorError::from(err).into()),
        }
    }

    /// Absolute URL value of `name`, in its normalized serialization.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] when the value is not an
    /// absolute URL.
    pub fn url(&self, name: &str) -> Result<Option<String>, ApiError> {
        let Some(raw) = self.raw(name).filter(|value| !value.is_empty()) else {
            return Ok(None);
        };
        Url::parse(raw)
            .map(|url| Some(url.to_string()))
            .map_err(|err| ApiError::invalid(format!("`{name}` is not a valid url: {err}")))
    }

    /// `numToSkip` and `limit` as a store page.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] when either is malformed.
    pub fn page(&self) -> Result<Page, ApiError> {
        Ok(Page::new(self.integer(NUM_TO_SKIP)?, self.integer(LIMIT)?))
    }

    /// `dateStart` and `dateEnd`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeMonitorError::InvalidDate`] when either is malformed.
    pub fn date_range(&self) -> Result<(Option<Timestamp>, Option<Timestamp>), ApiError> {
        Ok((self.date(DATE_START)?, self.date(DATE_END)?))
    }
}
