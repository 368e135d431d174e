//! JSON REST handlers for devices.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;

use homemonitor_app::ports::DocumentStore;
use homemonitor_app::services::{DeviceQuery, Listing};
use homemonitor_domain::device::Device;
use homemonitor_domain::id::DeviceId;

use super::{ListResponse, Payload, WriteResponse};
use crate::error::ApiError;
use crate::params::RequestParams;
use crate::state::AppState;

/// `GET /device`, `GET /device/{id}`, `GET /device/owner/{owner}`
///
/// A lookup by id still answers with a one-element array.
pub async fn list<S>(
    State(state): State<AppState<S>>,
    params: RequestParams,
) -> Result<ListResponse<Device>, ApiError>
where
    S: DocumentStore + 'static,
{
    let query = DeviceQuery {
        id: params.integer(Device::ID)?.map(DeviceId::new),
        owner: params.text(Device::OWNER),
    };
    let response = match state.device_service.list(query).await? {
        Listing::Cached(listing) => ListResponse::Cached(listing),
        Listing::Items(devices) => ListResponse::Items(Json(devices)),
    };
    Ok(response)
}

/// `DELETE /device?id=`
pub async fn delete<S>(
    State(state): State<AppState<S>>,
    params: RequestParams,
) -> Result<WriteResponse<Device>, ApiError>
where
    S: DocumentStore + 'static,
{
    let id = params
        .integer(Device::ID)?
        .ok_or_else(|| ApiError::invalid("Missing id for deleting Device"))?;
    state.device_service.delete(DeviceId::new(id)).await?;
    Ok(WriteResponse::Done)
}

/// `POST /device`, `PUT /device`
pub async fn save<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<WriteResponse<Device>, ApiError>
where
    S: DocumentStore + 'static,
{
    match Payload::<Device>::parse(&body)? {
        Payload::One(device) => {
            let saved = state.device_service.save(device).await?;
            Ok(WriteResponse::Saved(Json(saved)))
        }
        Payload::Many(devices) => {
            state.device_service.save_all(devices).await?;
            Ok(WriteResponse::Done)
        }
    }
}
