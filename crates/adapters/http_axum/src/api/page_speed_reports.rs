//! JSON REST handlers for page speed reports.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;

use homemonitor_app::ports::DocumentStore;
use homemonitor_app::services::PageSpeedQuery;
use homemonitor_domain::page_speed::PageSpeedReport;

use super::{ListResponse, Payload, WriteResponse};
use crate::error::ApiError;
use crate::params::{GRAPH, RequestParams};
use crate::state::AppState;

/// `GET /pagespeedreport`, `GET /pagespeedreport/{webPageUrlId}`,
/// `GET /pagespeedreport/url/{url}`
///
/// Accepts `id`, `webPageUrlId`, `url`, `dateStart`, `dateEnd`,
/// `numToSkip`, `limit` and `graph`.
pub async fn list<S>(
    State(state): State<AppState<S>>,
    params: RequestParams,
) -> Result<ListResponse<PageSpeedReport>, ApiError>
where
    S: DocumentStore + 'static,
{
    let (start, end) = params.date_range()?;
    let query = PageSpeedQuery {
        id: params.text(PageSpeedReport::ID),
        web_page_url_id: params.text(PageSpeedReport::WEB_PAGE_URL_ID),
        url: params.url(PageSpeedReport::URL)?,
        start,
        end,
        page: params.page()?,
    };
    let reports = state.report_service.list_page_speed(query).await?;
    Ok(ListResponse::shaped(reports, params.boolean(GRAPH)))
}

/// `DELETE /pagespeedreport?id=` or `DELETE /pagespeedreport?webPageUrlId=`
///
/// The page form removes every report of that page.
pub async fn delete<S>(
    State(state): State<AppState<S>>,
    params: RequestParams,
) -> Result<WriteResponse<PageSpeedReport>, ApiError>
where
    S: DocumentStore + 'static,
{
    if let Some(id) = params.text(PageSpeedReport::ID) {
        state.report_service.delete_page_speed(id).await?;
    } else if let Some(page) = params.text(PageSpeedReport::WEB_PAGE_URL_ID) {
        let removed = state.report_service.delete_page_speed_by_page(page).await?;
        tracing::info!(removed, "deleted page speed reports of a page");
    } else {
        return Err(ApiError::invalid(
            "Missing id or webPageUrlId for deleting PageSpeedReport",
        ));
    }
    Ok(WriteResponse::Done)
}

/// `POST /pagespeedreport`, `PUT /pagespeedreport`
///
/// The identity of every report is recomputed from its page and day.
pub async fn save<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<WriteResponse<PageSpeedReport>, ApiError>
where
    S: DocumentStore + 'static,
{
    match Payload::<PageSpeedReport>::parse(&body)? {
        Payload::One(report) => {
            let saved = state.report_service.save_page_speed(report).await?;
            Ok(WriteResponse::Saved(Json(saved)))
        }
        Payload::Many(reports) => {
            state.report_service.save_page_speeds(reports).await?;
            Ok(WriteResponse::Done)
        }
    }
}
