use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::reservations::CreateReservationCommand;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath};
use crate::infra::http::api::models::ReservationCreateRequest;
use crate::infra::http::api::state::ApiState;

use super::reservation_to_api;

pub async fn list_company_reservations(
    State(state): State<ApiState>,
    ApiPath(company_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = state
        .reservations
        .list_for_company(&company_id)
        .await
        .map_err(reservation_to_api)?;

    Ok(Json(reservations.to_vec()))
}

pub async fn list_user_reservations(
    State(state): State<ApiState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = state
        .reservations
        .list_for_user(&user_id)
        .await
        .map_err(reservation_to_api)?;

    Ok(Json(reservations.to_vec()))
}

pub async fn create_reservation(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<ReservationCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateReservationCommand {
        room_id: payload.room_id,
        user_id: payload.user_id,
        title: payload.title,
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
    };

    let reservation = state
        .reservations
        .create(command)
        .await
        .map_err(reservation_to_api)?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn delete_reservation(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .reservations
        .delete(id)
        .await
        .map_err(reservation_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
