//! JSON REST resource handlers.
//!
//! Each resource answers `GET`, `DELETE`, `POST`, `PUT` and `OPTIONS` on
//! every path it owns. Writes are only accepted on the collection root;
//! any other verb gets the `Method Not Allowed` envelope.

#[allow(clippy::missing_errors_doc)]
pub mod device_reports;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod page_speed_reports;

use axum::Json;
use axum::Router;
use axum::http::{Method, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use homemonitor_app::ports::DocumentStore;
use homemonitor_domain::chart::{ChartTable, Chartable};
use homemonitor_domain::error::{HomeMonitorError, NotFoundError};

use crate::error::ApiError;
use crate::state::AppState;

/// `Cache-Control` sent with every successful read.
pub const READ_CACHE_CONTROL: &str = "public, max-age=86400";

/// Verbs reported by `OPTIONS`.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

const COLLECTION_ROOTS: [&str; 3] = ["/device", "/devicereport", "/pagespeedreport"];

/// Build the resource router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: DocumentStore + 'static,
{
    Router::new()
        // Devices
        .route(
            "/device",
            resource(
                get(devices::list::<S>)
                    .delete(devices::delete::<S>)
                    .post(devices::save::<S>)
                    .put(devices::save::<S>),
            ),
        )
        .route(
            "/device/{id}",
            nested(get(devices::list::<S>).delete(devices::delete::<S>)),
        )
        .route(
            "/device/owner/{owner}",
            nested(get(devices::list::<S>).delete(devices::delete::<S>)),
        )
        // Temperature and humidity reports
        .route(
            "/devicereport",
            resource(
                get(device_reports::list::<S>)
                    .delete(device_reports::delete::<S>)
                    .post(device_reports::save::<S>)
                    .put(device_reports::save::<S>),
            ),
        )
        .route(
            "/devicereport/{deviceId}",
            nested(get(device_reports::list::<S>).delete(device_reports::delete::<S>)),
        )
        // Page speed reports
        .route(
            "/pagespeedreport",
            resource(
                get(page_speed_reports::list::<S>)
                    .delete(page_speed_reports::delete::<S>)
                    .post(page_speed_reports::save::<S>)
                    .put(page_speed_reports::save::<S>),
            ),
        )
        .route(
            "/pagespeedreport/{webPageUrlId}",
            nested(get(page_speed_reports::list::<S>).delete(page_speed_reports::delete::<S>)),
        )
        .route(
            "/pagespeedreport/url/{url}",
            nested(get(page_speed_reports::list::<S>).delete(page_speed_reports::delete::<S>)),
        )
}

fn resource<S>(verbs: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    verbs.options(options).fallback(method_not_allowed)
}

fn nested<S>(verbs: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    resource(verbs.post(write_below_root).put(write_below_root))
}

/// `OPTIONS` on any resource path.
pub async fn options() -> impl IntoResponse {
    [(header::ALLOW, ALLOWED_METHODS)]
}

/// Any verb a resource does not implement.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// `POST`/`PUT` on a path with segments below the collection root.
pub async fn write_below_root() -> ApiError {
    below_root_error()
}

fn below_root_error() -> ApiError {
    ApiError::invalid(
        "Post/Put is only supported on the collection root, without additional path segments",
    )
}

fn is_below_root(path: &str) -> bool {
    COLLECTION_ROOTS.iter().any(|root| {
        path.strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Any path no route owns. Writes deeper below a collection root than its
/// routes reach are still rejected as writes below the root.
pub async fn unknown_route(method: Method, uri: Uri) -> ApiError {
    if matches!(method, Method::POST | Method::PUT) && is_below_root(uri.path()) {
        return below_root_error();
    }
    HomeMonitorError::from(NotFoundError {
        entity: "resource",
        field: "path",
    })
    .into()
}

/// Attach the read cache header to a successful read.
fn cacheable(response: impl IntoResponse) -> Response {
    ([(header::CACHE_CONTROL, READ_CACHE_CONTROL)], response).into_response()
}

/// A write body: one object or an array of objects.
#[derive(Debug)]
pub enum Payload<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: DeserializeOwned> Payload<T> {
    /// Decode a request body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] when the body is not JSON, is
    /// neither an object nor an array, or does not describe `T`.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| ApiError::invalid(format!("malformed json body: {err}")))?;
        let decoded = match value {
            Value::Array(_) => serde_json::from_value(value).map(Self::Many),
            Value::Object(_) => serde_json::from_value(value).map(Self::One),
            _ => {
                return Err(ApiError::invalid(
                    "body must be a json object or an array of objects",
                ));
            }
        };
        decoded.map_err(|err| ApiError::invalid(err.to_string()))
    }
}

/// Possible responses from a resource list endpoint.
pub enum ListResponse<T> {
    /// Records as a flat JSON array.
    Items(Json<Vec<T>>),
    /// Records reshaped into chart columns and rows.
    Chart(Json<ChartTable>),
    /// A listing already serialized by the cache.
    Cached(String),
}

impl<T: Chartable> ListResponse<T> {
    /// Flat list, or chart table when `graph` is set.
    pub fn shaped(records: Vec<T>, graph: bool) -> Self {
        if graph {
            Self::Chart(Json(ChartTable::from_records(&records)))
        } else {
            Self::Items(Json(records))
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Items(json) => cacheable(json),
            Self::Chart(json) => cacheable(json),
            Self::Cached(listing) => cacheable((
                [(header::CONTENT_TYPE, "application/json")],
                listing,
            )),
        }
    }
}

/// Possible responses from a resource write endpoint.
pub enum WriteResponse<T> {
    /// A single record, as stored.
    Saved(Json<T>),
    /// Several records were saved, or records were deleted.
    Done,
}

impl<T: Serialize> IntoResponse for WriteResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Saved(json) => json.into_response(),
            Self::Done => "OK".into_response(),
        }
    }
}
