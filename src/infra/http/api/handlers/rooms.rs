use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::rooms::CreateRoomCommand;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::models::{RoomCreateRequest, RoomsQuery};
use crate::infra::http::api::state::ApiState;

use super::room_to_api;

/// Room listings change rarely but must not be served stale by intermediaries.
const ROOMS_CACHE_CONTROL: &str = "private, no-cache, must-revalidate";

pub async fn list_company_rooms(
    State(state): State<ApiState>,
    ApiPath(company_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<RoomsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = state
        .rooms
        .list_for_company(&company_id, query.user_id.as_deref())
        .await
        .map_err(room_to_api)?;

    Ok((
        [
            (header::CACHE_CONTROL, ROOMS_CACHE_CONTROL),
            (header::VARY, "Accept-Encoding"),
        ],
        Json(rooms),
    ))
}

pub async fn create_room(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<RoomCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateRoomCommand {
        company: payload.company_id,
        name: payload.name,
        capacity: payload.capacity,
        restricted_to: payload.restricted_to,
    };

    let room = state.rooms.create(command).await.map_err(room_to_api)?;

    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn delete_room(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.rooms.delete(id).await.map_err(room_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
