//! Data endpoints: authorized passthrough of dashboard files from the object store.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared_types::SyncStatus;

use crate::auth::authorize_request;
use crate::error::{ApiError, ApiResult};
use crate::storage::StorageError;
use crate::AppState;

/// Objects the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Revenue,
    RankHistory,
    AgentNiche,
    SyncLog,
}

impl Dataset {
    /// Object key in the store.
    pub fn key(self) -> &'static str {
        match self {
            Dataset::Revenue => "revenue-history.csv",
            Dataset::RankHistory => "RD History.csv",
            Dataset::AgentNiche => "site-agent-niche.csv",
            Dataset::SyncLog => "sync-log.json",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Dataset::SyncLog => "application/json",
            _ => "text/csv",
        }
    }

    /// Agent/niche data is uploaded by hand about monthly, so it caches longer.
    fn cache_control(self) -> &'static str {
        match self {
            Dataset::Revenue | Dataset::RankHistory => "public, max-age=300",
            Dataset::AgentNiche => "public, max-age=3600",
            Dataset::SyncLog => "public, max-age=60",
        }
    }

    fn not_found_error(self) -> &'static str {
        match self {
            Dataset::Revenue | Dataset::RankHistory => "Data not found",
            Dataset::AgentNiche => "Agent/Niche data not found",
            Dataset::SyncLog => "Sync log not found",
        }
    }

    fn failure_error(self) -> &'static str {
        match self {
            Dataset::Revenue | Dataset::RankHistory => "Failed to fetch data",
            Dataset::AgentNiche => "Failed to fetch agent/niche data",
            Dataset::SyncLog => "Failed to fetch sync log",
        }
    }
}

/// Authorize the request, then load `dataset` from the store.
async fn load(state: &AppState, headers: &HeaderMap, dataset: Dataset) -> ApiResult<Vec<u8>> {
    authorize_request(headers, &state.auth_config)?;

    state
        .store
        .get(dataset.key())
        .await
        .map_err(|e| match e {
            StorageError::NotFound(key) => {
                tracing::warn!("Object {} not found", key);
                ApiError::not_found(dataset.not_found_error())
            }
            StorageError::Backend(source) => ApiError::internal(dataset.failure_error(), source),
        })
}

async fn serve_csv(state: &AppState, headers: &HeaderMap, dataset: Dataset) -> ApiResult<Response> {
    let body = load(state, headers, dataset).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, dataset.content_type()),
            (header::CACHE_CONTROL, dataset.cache_control()),
        ],
        body,
    )
        .into_response())
}

/// `GET /api/data/revenue`
pub async fn revenue(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    serve_csv(&state, &headers, Dataset::Revenue).await
}

/// `GET /api/data/rd`
pub async fn rank_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_csv(&state, &headers, Dataset::RankHistory).await
}

/// `GET /api/data/agent-niche`
pub async fn agent_niche(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    serve_csv(&state, &headers, Dataset::AgentNiche).await
}

fn sync_log_missing(err: ApiError) -> ApiError {
    match err {
        ApiError::NotFound { error, .. } => ApiError::NotFound {
            error,
            message: Some(
                "No sync has been run yet. The log will be created after the first sync."
                    .to_string(),
            ),
        },
        other => other,
    }
}

/// `GET /api/data/sync-log`: the full sync log, re-serialized.
pub async fn sync_log(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let bytes = load(&state, &headers, Dataset::SyncLog)
        .await
        .map_err(sync_log_missing)?;
    let log: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::internal(Dataset::SyncLog.failure_error(), e))?;

    Ok((
        [(header::CACHE_CONTROL, Dataset::SyncLog.cache_control())],
        Json(log),
    )
        .into_response())
}

/// `GET /api/data/sync-status`: only the summary fields of the sync log.
pub async fn sync_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let bytes = load(&state, &headers, Dataset::SyncLog).await?;
    let status: SyncStatus = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::internal("Failed to fetch sync status", e))?;

    Ok((
        [(header::CACHE_CONTROL, Dataset::SyncLog.cache_control())],
        Json(status),
    )
        .into_response())
}
