//! JSON REST handlers for temperature and humidity reports.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;

use homemonitor_app::ports::DocumentStore;
use homemonitor_app::services::TemperatureQuery;
use homemonitor_domain::id::{DeviceId, ReportId};
use homemonitor_domain::report::{DeviceReport, DeviceTemperatureHumidityReport};

use super::{ListResponse, Payload, WriteResponse};
use crate::error::ApiError;
use crate::params::{GRAPH, RequestParams};
use crate::state::AppState;

type Report = DeviceTemperatureHumidityReport;

/// `GET /devicereport`, `GET /devicereport/{deviceId}`
///
/// Accepts `id`, `deviceId`, `dateStart`, `dateEnd`, `numToSkip`, `limit`
/// and `graph`.
pub async fn list<S>(
    State(state): State<AppState<S>>,
    params: RequestParams,
) -> Result<ListResponse<Report>, ApiError>
where
    S: DocumentStore + 'static,
{
    let (start, end) = params.date_range()?;
    let query = TemperatureQuery {
        id: params.integer(DeviceReport::ID)?.map(ReportId::new),
        device_id: params.integer(DeviceReport::DEVICE_ID)?.map(DeviceId::new),
        start,
        end,
        page: params.page()?,
    };
    let reports = state.report_service.list_temperature(query).await?;
    Ok(ListResponse::shaped(reports, params.boolean(GRAPH)))
}

/// `DELETE /devicereport?id=`
pub async fn delete<S>(
    State(state): State<AppState<S>>,
    params: RequestParams,
) -> Result<WriteResponse<Report>, ApiError>
where
    S: DocumentStore + 'static,
{
    let id = params.integer(DeviceReport::ID)?.ok_or_else(|| {
        ApiError::invalid("Missing id for deleting DeviceTemperatureHumidityReport")
    })?;
    state
        .report_service
        .delete_temperature(ReportId::new(id))
        .await?;
    Ok(WriteResponse::Done)
}

/// `POST /devicereport`, `PUT /devicereport`
pub async fn save<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<WriteResponse<Report>, ApiError>
where
    S: DocumentStore + 'static,
{
    match Payload::<Report>::parse(&body)? {
        Payload::One(report) => {
            let saved = state.report_service.save_temperature(report).await?;
            Ok(WriteResponse::Saved(Json(saved)))
        }
        Payload::Many(reports) => {
            state.report_service.save_temperatures(reports).await?;
            Ok(WriteResponse::Done)
        }
    }
}
