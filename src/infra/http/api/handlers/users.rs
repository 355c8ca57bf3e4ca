use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::users::CreateUserCommand;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath};
use crate::infra::http::api::models::UserCreateRequest;
use crate::infra::http::api::state::ApiState;

use super::user_to_api;

pub async fn create_user(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<UserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateUserCommand {
        company: payload.company_id,
        email: payload.email,
        display_name: payload.display_name,
        role: payload.role,
    };

    let user = state.users.create(command).await.map_err(user_to_api)?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_company_users(
    State(state): State<ApiState>,
    ApiPath(company_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .users
        .list_for_company(&company_id)
        .await
        .map_err(user_to_api)?;

    Ok(Json(users))
}
