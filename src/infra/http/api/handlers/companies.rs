use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath};
use crate::infra::http::api::models::CompanyCreateRequest;
use crate::infra::http::api::state::ApiState;

use super::company_to_api;

pub async fn create_company(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<CompanyCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let company = state
        .companies
        .create(&payload.name, payload.slug.as_deref())
        .await
        .map_err(company_to_api)?;

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<ApiState>,
    ApiPath(company_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let company = state
        .companies
        .get(&company_id)
        .await
        .map_err(company_to_api)?;

    Ok(Json(company))
}
