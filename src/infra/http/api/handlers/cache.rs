//! Operator endpoints for the listing cache.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::cache::Namespace;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::ApiPath;
use crate::infra::http::api::state::ApiState;

pub async fn cache_stats(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.cache.stats())
}

pub async fn clear_cache(State(state): State<ApiState>) -> impl IntoResponse {
    let removed = state.cache.clear();
    info!(target = "roombook::cache", removed, "listing cache cleared");
    StatusCode::NO_CONTENT
}

pub async fn clear_cache_namespace(
    State(state): State<ApiState>,
    ApiPath(namespace): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let namespace: Namespace = namespace
        .parse()
        .map_err(|err: crate::cache::KeyError| {
            ApiError::bad_request("Unknown cache namespace", err.to_string())
        })?;

    let removed = state.cache.invalidate_namespace(namespace);
    info!(
        target = "roombook::cache",
        %namespace,
        removed,
        "listing cache namespace cleared"
    );
    Ok(StatusCode::NO_CONTENT)
}
