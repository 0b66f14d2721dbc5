pub mod params;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use opentelemetry::KeyValue;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::params::{PageParams, SyncParams};
use crate::indexer::LogFetcher;
use crate::metrics::Metrics;
use crate::models::datasets::logs::{EventLogRecord, LogPage};
use crate::models::errors::ApiError;
use crate::storage::LogStore;

/// Shared handles every request works with, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn LogFetcher>,
    pub store: Arc<dyn LogStore>,
    pub metrics: Option<Arc<Metrics>>,
}

impl AppState {
    pub fn new(
        fetcher: Arc<dyn LogFetcher>,
        store: Arc<dyn LogStore>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            fetcher,
            store,
            metrics,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersResponse {
    pub logs: Vec<EventLogRecord>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_logs: u64,
}

impl From<LogPage> for TransfersResponse {
    fn from(page: LogPage) -> Self {
        Self {
            logs: page.items,
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_logs: page.total_count,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidBlockNumbers => (StatusCode::BAD_REQUEST, "Invalid block numbers"),
            ApiError::Read(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            ApiError::Fetch(_) | ApiError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        };

        if status.is_server_error() {
            error!("Error: {}", self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/usdtTransfers", get(list_transfers))
        .route("/usdtTransfers/sync", post(sync_transfers))
        .with_state(state)
}

async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<TransfersResponse>, ApiError> {
    let (page, per_page) = PageParams::from_query(&query).normalize();

    let page = state
        .store
        .page(page, per_page)
        .await
        .map_err(ApiError::Read)?;

    Ok(Json(page.into()))
}

async fn sync_transfers(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    let Some((from_block, to_block)) = SyncParams::from_query(&query).block_range() else {
        warn!("Rejected sync request with invalid block numbers: {:?}", query);
        return Err(ApiError::InvalidBlockNumbers);
    };

    if let Some(metrics) = &state.metrics {
        metrics
            .sync_requests
            .add(1, &[KeyValue::new("contract", metrics.contract.clone())]);
    }

    let records = state.fetcher.fetch(from_block, to_block).await?;
    let count = records.len();

    state.store.append_all(records).await?;
    info!(
        "Data with {} logs inserted successfully (blocks {}-{})",
        count, from_block, to_block
    );

    Ok(StatusCode::OK)
}
