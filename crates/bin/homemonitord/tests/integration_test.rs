//! End-to-end tests for the full homemonitord stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! document store, real services, real axum router) and exercises the HTTP
//! layer via `tower::ServiceExt::oneshot`. No TCP port is bound.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use homemonitor_adapter_http_axum::router;
use homemonitor_adapter_http_axum::state::AppState;
use homemonitor_adapter_storage_sqlite_sqlx::Config;
use homemonitor_app::list_cache::ListCache;
use homemonitor_app::services::{DeviceService, EntityPersister, ReportService};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> Router {
    let db = Config::new("sqlite::memory:")
        .build()
        .await
        .expect("in-memory database should initialise");

    let persister = EntityPersister::new(db.document_store());
    let device_service = Arc::new(DeviceService::new(
        persister.clone(),
        Arc::new(ListCache::new()),
    ));
    let report_service = Arc::new(ReportService::new(persister));
    device_service.declare_indexes().await.unwrap();
    report_service.declare_indexes().await.unwrap();
    device_service.warm_cache().await;

    router::build(AppState::from_arcs(device_service, report_service))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Reply {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> Reply {
    call(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> Reply {
    call(app, Method::POST, uri, Some(body)).await
}

fn temperature(device_id: i64, date: &str, temperature: f64) -> Value {
    json!({
        "deviceId": device_id,
        "date": date,
        "temperature": temperature,
        "humidity": 40.0,
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let reply = get(&app().await, "/health").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, Value::String("OK".into()));
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_assign_id_and_timestamps_when_device_is_posted() {
    let app = app().await;
    let reply = post(
        &app,
        "/device",
        json!({
            "owner": "alice",
            "description": "sensor1",
            "location": "kitchen",
            "types": ["Temperature"],
        }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["id"].is_i64());
    assert!(reply.body["created"].is_string());
    assert_eq!(reply.body["created"], reply.body["updated"]);
    assert_eq!(reply.body["types"], json!(["Temperature"]));
}

#[tokio::test]
async fn should_return_not_found_when_owner_has_no_devices() {
    let app = app().await;
    post(&app, "/device", json!({"owner": "alice"})).await;

    let reply = get(&app, "/device/owner/bob").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Not Found");
    assert_eq!(
        reply.body["exception_message"],
        "No Device with that owner was found"
    );
}

#[tokio::test]
async fn should_list_devices_of_owner_from_path() {
    let app = app().await;
    post(
        &app,
        "/device",
        json!([{"owner": "alice"}, {"owner": "bob"}, {"owner": "alice"}]),
    )
    .await;

    let reply = get(&app, "/device/owner/alice").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn should_refresh_device_listing_after_every_write() {
    let app = app().await;
    assert_eq!(get(&app, "/device").await.body, json!([]));

    let saved = post(&app, "/device", json!({"owner": "alice"})).await.body;
    let listed = get(&app, "/device").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, json!([saved]));

    let id = saved["id"].as_i64().unwrap();
    let deleted = call(&app, Method::DELETE, &format!("/device?id={id}"), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, Value::String("OK".into()));
    assert_eq!(get(&app, "/device").await.body, json!([]));
}

#[tokio::test]
async fn should_return_single_element_array_when_device_requested_by_id() {
    let app = app().await;
    let saved = post(&app, "/device", json!({"owner": "alice"})).await.body;
    let id = saved["id"].as_i64().unwrap();

    let reply = get(&app, &format!("/device/{id}")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([saved]));

    let missing = get(&app, &format!("/device?id={}", id + 100)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reject_device_without_owner() {
    let app = app().await;
    let reply = post(&app, "/device", json!({"owner": ""})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_params");
}

#[tokio::test]
async fn should_reject_write_below_collection_root() {
    let app = app().await;
    let reply = post(&app, "/device/owner/alice", json!({"owner": "alice"})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_params");
    assert_eq!(get(&app, "/device").await.body, json!([]));
}

#[tokio::test]
async fn should_keep_creating_devices_after_save_with_unknown_id() {
    let app = app().await;
    let stray = post(&app, "/device", json!({"id": 2, "owner": "x"})).await;
    assert_eq!(stray.status, StatusCode::NOT_FOUND);

    for owner in ["y", "z", "w"] {
        let reply = post(&app, "/device", json!({ "owner": owner })).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body["id"].is_i64());
    }
    let listed = get(&app, "/device").await;
    assert_eq!(listed.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn should_reject_write_deeper_than_any_route() {
    let app = app().await;
    let reply = post(&app, "/device/7/x", json!({"owner": "alice"})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_params");
}

#[tokio::test]
async fn should_return_not_found_when_deleting_unknown_device() {
    let app = app().await;
    let reply = call(&app, Method::DELETE, "/device?id=42", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Temperature reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_chart_device_reports_in_date_range_newest_first() {
    let app = app().await;
    let saved = post(
        &app,
        "/devicereport",
        json!([
            temperature(7, "2020-01-05T10:00:00Z", 19.5),
            temperature(7, "2020-01-20T10:00:00Z", 21.0),
            temperature(7, "2020-02-10T10:00:00Z", 23.0),
            temperature(8, "2020-01-10T10:00:00Z", 30.0),
        ]),
    )
    .await;
    assert_eq!(saved.status, StatusCode::OK);

    let reply = get(
        &app,
        "/devicereport?deviceId=7&dateStart=2020-01-01&dateEnd=2020-01-31&graph=true",
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body["cols"],
        json!([
            {"label": "Date", "type": "date"},
            {"label": "Temperature", "type": "number"},
            {"label": "Humidity", "type": "number"},
        ])
    );
    let rows = reply.body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["c"][0]["v"], "Date(2020,0,20,10,0,0,0)");
    assert_eq!(rows[0]["c"][1]["v"], 21.0);
    assert_eq!(rows[1]["c"][0]["v"], "Date(2020,0,5,10,0,0,0)");
}

#[tokio::test]
async fn should_page_device_reports_as_contiguous_slices() {
    let app = app().await;
    let reports: Vec<Value> = (1..=5)
        .map(|day| temperature(3, &format!("2021-06-0{day}T08:00:00Z"), f64::from(day)))
        .collect();
    post(&app, "/devicereport", Value::Array(reports)).await;

    let reply = get(&app, "/devicereport/3?numToSkip=1&limit=2").await;
    assert_eq!(reply.status, StatusCode::OK);
    let temperatures: Vec<f64> = reply
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["temperature"].as_f64().unwrap())
        .collect();
    assert_eq!(temperatures, vec![4.0, 3.0]);
}

#[tokio::test]
async fn should_distinguish_not_found_from_empty_collection() {
    let app = app().await;
    let empty = get(&app, "/devicereport").await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body, json!([]));

    let scoped = get(&app, "/devicereport?deviceId=99").await;
    assert_eq!(scoped.status, StatusCode::NOT_FOUND);
    assert_eq!(scoped.body["error"], "Not Found");
}

#[tokio::test]
async fn should_reject_unparsable_date() {
    let app = app().await;
    let reply = get(&app, "/devicereport?deviceId=7&dateStart=someday").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_text_params");
}

#[tokio::test]
async fn should_ignore_empty_date_bounds() {
    let app = app().await;
    post(&app, "/devicereport", temperature(7, "2020-01-05T10:00:00Z", 20.0)).await;

    let reply = get(&app, "/devicereport?deviceId=7&dateStart=&dateEnd=").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn should_delete_device_report_by_id() {
    let app = app().await;
    let saved = post(
        &app,
        "/devicereport",
        temperature(7, "2020-01-05T10:00:00Z", 19.5),
    )
    .await
    .body;
    let id = saved["id"].as_i64().unwrap();

    let reply = call(&app, Method::DELETE, &format!("/devicereport?id={id}"), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        get(&app, &format!("/devicereport?id={id}")).await.status,
        StatusCode::NOT_FOUND
    );
}

// ---------------------------------------------------------------------------
// Page speed reports
// ---------------------------------------------------------------------------

fn page_speed(date: &str, mobile_speed: i32) -> Value {
    json!({
        "webPageUrlId": "home",
        "url": "https://example.com/",
        "date": date,
        "pageSpeedMobileSpeed": mobile_speed,
        "pageSpeedMobileUX": 80,
        "pageSpeedDesktopSpeed": 90,
    })
}

#[tokio::test]
async fn should_keep_one_page_speed_report_per_page_and_day() {
    let app = app().await;
    let first = post(&app, "/pagespeedreport", page_speed("2024-03-05T08:00:00Z", 50)).await;
    assert_eq!(first.body["id"], "home-20240305");
    post(&app, "/pagespeedreport", page_speed("2024-03-05T20:00:00Z", 70)).await;

    let reply = get(&app, "/pagespeedreport/home").await;
    assert_eq!(reply.status, StatusCode::OK);
    let reports = reply.body.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["pageSpeedMobileSpeed"], 70);
    assert_eq!(reports[0]["id"], "home-20240305");
}

#[tokio::test]
async fn should_find_page_speed_reports_by_encoded_url() {
    let app = app().await;
    post(
        &app,
        "/pagespeedreport",
        json!([
            page_speed("2024-03-05T08:00:00Z", 50),
            page_speed("2024-03-06T08:00:00Z", 60),
        ]),
    )
    .await;

    let reply = get(
        &app,
        "/pagespeedreport/url/https%3A%2F%2Fexample.com%2F?graph=true",
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let rows = reply.body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["c"][0]["v"], "Date(2024,2,6)");
    assert_eq!(reply.body["cols"][1]["label"], "Desktop Speed");
}

#[tokio::test]
async fn should_delete_every_report_of_a_page() {
    let app = app().await;
    post(
        &app,
        "/pagespeedreport",
        json!([
            page_speed("2024-03-05T08:00:00Z", 50),
            page_speed("2024-03-06T08:00:00Z", 60),
        ]),
    )
    .await;

    let reply = call(&app, Method::DELETE, "/pagespeedreport?webPageUrlId=home", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        get(&app, "/pagespeedreport?webPageUrlId=home").await.status,
        StatusCode::NOT_FOUND
    );

    let again = call(&app, Method::DELETE, "/pagespeedreport?webPageUrlId=home", None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reject_page_speed_delete_without_identifier() {
    let app = app().await;
    let reply = call(&app, Method::DELETE, "/pagespeedreport", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_params");
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_mark_reads_cacheable_for_a_day() {
    let app = app().await;
    let reply = get(&app, "/pagespeedreport").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CACHE_CONTROL], "public, max-age=86400");
}

#[tokio::test]
async fn should_return_method_not_allowed_envelope_for_unsupported_verb() {
    let app = app().await;
    let reply = call(&app, Method::PATCH, "/devicereport", Some(json!({}))).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(reply.body["error"], "Method Not Allowed");
}

#[tokio::test]
async fn should_report_allowed_verbs_on_options() {
    let app = app().await;
    let reply = call(&app, Method::OPTIONS, "/device", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.headers[header::ALLOW],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
}

#[tokio::test]
async fn should_answer_cors_preflight_for_any_origin() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/devicereport")
        .header(header::ORIGIN, "https://charts.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://charts.example"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
}
