//! Axum router assembly.

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use homemonitor_app::ports::DocumentStore;

use crate::state::AppState;

/// How long browsers may reuse a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24);

/// Build the top-level axum [`Router`].
///
/// Serves the resources at the root, answers unknown paths with the
/// `Not Found` envelope and wraps everything in a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level and a [`CorsLayer`]
/// that accepts any origin with credentials.
pub fn build<S>(state: AppState<S>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::api::routes())
        .fallback(crate::api::unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Mirror the caller's origin, method and headers so credentialed requests
/// from any site are accepted.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE)
}

async fn health_check() -> &'static str {
    "OK"
}
