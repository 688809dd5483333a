//! HTTP route handlers.
//!
//! Store calls are synchronous, so each one runs on tokio's blocking pool.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::error::{BucketKvError, Result};
use crate::store::Store;
use crate::types::{validate_bucket, RecordId};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

/// Query parameters of `GET /_list`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub bucket: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketsResponse {
    pub buckets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeysResponse {
    pub bucket: String,
    pub keys: Vec<String>,
}

/// Handle POST /{bucket}/{key}
pub async fn handle_put(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let id = RecordId::new(bucket, key)?;
    run_blocking(&state.store, move |store| store.set(&id, &body)).await?;
    Ok(StatusCode::OK)
}

/// Handle GET /{bucket}/{key}
pub async fn handle_get(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let id = RecordId::new(bucket, key)?;
    let value = run_blocking(&state.store, move |store| store.get(&id)).await?;
    Ok(([(CONTENT_TYPE, "application/octet-stream")], value))
}

/// Handle DELETE /{bucket}/{key}
pub async fn handle_delete(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> std::result::Result<StatusCode, ApiError> {
    let id = RecordId::new(bucket, key)?;
    run_blocking(&state.store, move |store| store.delete(&id)).await?;
    Ok(StatusCode::OK)
}

/// Handle GET, POST and DELETE on /{bucket}/ where the key segment is empty
pub async fn handle_missing_key(Path(bucket): Path<String>) -> ApiError {
    ApiError(BucketKvError::Validation(format!(
        "key must not be empty (bucket {bucket:?})"
    )))
}

/// Handle GET /_list and GET /_list?bucket={bucket}
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> std::result::Result<axum::response::Response, ApiError> {
    match params.bucket {
        Some(bucket) => {
            validate_bucket(&bucket)?;
            let lookup = bucket.clone();
            let keys = run_blocking(&state.store, move |store| store.list_keys(&lookup)).await?;
            Ok(Json(KeysResponse { bucket, keys }).into_response())
        }
        None => {
            let buckets = run_blocking(&state.store, Store::list_buckets).await?;
            Ok(Json(BucketsResponse { buckets }).into_response())
        }
    }
}

/// Handle GET /health
pub async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn run_blocking<T, F>(store: &Arc<Store>, op: F) -> Result<T>
where
    F: FnOnce(&Store) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| BucketKvError::Internal(format!("store task failed: {e}")))?
}
