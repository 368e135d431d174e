//! HTTP error response mapping.
//!
//! Every failure leaves a handler as the same JSON envelope:
//! `{"error": code, "message": text, "exception_message"?: text}`.

use std::error::Error as _;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use homemonitor_domain::error::HomeMonitorError;

/// JSON error body returned by every resource.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception_message: Option<String>,
}

/// Failures a handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// A failure reported by the application layer.
    Domain(HomeMonitorError),
    /// A request parameter or body could not be read.
    InvalidParameter(String),
    /// The resource does not implement the requested verb.
    MethodNotAllowed,
}

impl From<HomeMonitorError> for ApiError {
    fn from(err: HomeMonitorError) -> Self {
        Self::Domain(err)
    }
}

impl ApiError {
    /// Shorthand for [`ApiError::InvalidParameter`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidParameter(_)
            | Self::Domain(HomeMonitorError::Validation(_) | HomeMonitorError::InvalidDate(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Domain(HomeMonitorError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Domain(
                HomeMonitorError::StoreUnavailable(_) | HomeMonitorError::Storage(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self, status: StatusCode) -> ErrorBody {
        let reason = || status.canonical_reason().unwrap_or_default().to_string();
        match self {
            Self::InvalidParameter(message) => ErrorBody {
                error: "invalid_params".to_string(),
                message: "Check your request parameters",
                exception_message: Some(message.clone()).filter(|m| !m.is_empty()),
            },
            Self::Domain(HomeMonitorError::Validation(err)) => ErrorBody {
                error: "invalid_params".to_string(),
                message: "Check your request parameters",
                exception_message: Some(err.to_string()),
            },
            Self::Domain(HomeMonitorError::InvalidDate(err)) => ErrorBody {
                error: "invalid_text_params".to_string(),
                message: "Check your REST Parameters. Likely an invalid date format.",
                exception_message: Some(err.to_string()),
            },
            Self::Domain(HomeMonitorError::NotFound(err)) => ErrorBody {
                error: reason(),
                message: "Nothing found, check your URL/Parameters",
                exception_message: Some(err.to_string()),
            },
            Self::MethodNotAllowed => ErrorBody {
                error: reason(),
                message: "Check that this method is allowed by the resource",
                exception_message: None,
            },
            Self::Domain(err) => ErrorBody {
                error: "internal_error".to_string(),
                message: "There was an error processing the request, see the server logs for more info",
                exception_message: err.source().map(ToString::to_string),
            },
        }
    }
}

/// Render an error and its whole `source()` chain on one line.
fn chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body(status);
        match &self {
            Self::Domain(err) => {
                tracing::error!(status = status.as_u16(), error = %chain(err), "request failed");
            }
            Self::InvalidParameter(message) => {
                tracing::error!(status = status.as_u16(), error = %message, "request failed");
            }
            Self::MethodNotAllowed => {
                tracing::error!(status = status.as_u16(), "method not allowed");
            }
        }
        (status, Json(body)).into_response()
    }
}
