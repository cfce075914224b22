use crate::api::stats;
use crate::capture::middleware::{track_visits, AppState};
use crate::query::summary;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
///
/// The visit-tracking middleware wraps every route and the fallback, so any
/// inbound path is observed even when nothing is mounted on it.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Restrictive CORS for the dashboard read API
    let dashboard_cors = build_dashboard_cors(state.dashboard_origin.as_deref());

    let insights_routes = Router::new()
        .route("/insights/stats", get(stats::get_stats))
        .route("/insights/chart", get(stats::get_chart))
        .route("/insights/source", get(stats::get_source))
        .layer(dashboard_cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .nest("/api", insights_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            track_visits,
        ))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build CORS layer for the dashboard routes based on configured origin.
fn build_dashboard_cors(dashboard_origin: Option<&str>) -> CorsLayer {
    dashboard_origin.map_or_else(
        || {
            // No dashboard origin configured — allow all origins.
            // Set `dashboard_origin` in config to restrict cross-origin access.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        },
        |origin| {
            let allowed_origin = origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("*"));
            CorsLayer::new()
                .allow_origin(allowed_origin)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true)
        },
    )
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// GET /health — Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

/// GET /health/detailed — Detailed health check with system info.
async fn detailed_health_check(
    State(state): State<Arc<AppState>>,
) -> axum::Json<serde_json::Value> {
    let conn = Arc::clone(&state.conn);
    let total_visits = tokio::task::spawn_blocking(move || {
        let conn = conn.lock();
        summary::count_visits(&conn, None)
    })
    .await
    .ok()
    .and_then(Result::ok);

    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "capture_enabled": state.capture_enabled,
        "total_visits": total_visits,
    }))
}
