use axum::extract::{Query, State};
use axum::Json;
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::capture::middleware::AppState;
use crate::query::{daily, sources, summary};

/// Query parameters for the chart endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartParams {
    #[serde(default = "default_chart_days")]
    pub days: u64,
}

const fn default_chart_days() -> u64 {
    10
}

/// Query parameters for the source distribution endpoint.
#[derive(Debug, Deserialize)]
pub struct SourceParams {
    #[serde(default = "default_source_days")]
    pub days: u64,
    #[serde(default = "default_source_limit")]
    pub limit: usize,
}

const fn default_source_days() -> u64 {
    30
}

const fn default_source_limit() -> usize {
    10
}

/// GET /api/insights/stats — Summary cards with week-over-week trends.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<summary::StatSummary>, ApiError> {
    let now = Local::now().naive_local();
    let conn = Arc::clone(&state.conn);
    let result = tokio::task::spawn_blocking(move || {
        let conn = conn.lock();
        summary::query_summary(&conn, now)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))??;

    Ok(Json(result))
}

/// GET /api/insights/chart — Daily visit counts for the trailing window.
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Vec<daily::TimeSeriesPoint>>, ApiError> {
    if params.days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }

    let now = Local::now().naive_local();
    let conn = Arc::clone(&state.conn);
    let result = tokio::task::spawn_blocking(move || {
        let conn = conn.lock();
        daily::query_daily_series(&conn, now, params.days)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))??;

    Ok(Json(result))
}

/// GET /api/insights/source — Ranked traffic-source distribution.
pub async fn get_source(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> Result<Json<Vec<sources::SourceBucket>>, ApiError> {
    if params.days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }
    if params.limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }

    let now = Local::now().naive_local();
    let conn = Arc::clone(&state.conn);
    let result = tokio::task::spawn_blocking(move || {
        let conn = conn.lock();
        sources::query_source_distribution(&conn, now, params.days, params.limit)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))??;

    Ok(Json(result))
}
