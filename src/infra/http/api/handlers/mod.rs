//! API handlers organized by resource type.
//!
//! Service errors are mapped to [`ApiError`] here so every resource answers
//! with the same status codes for the same failure.

mod cache;
mod companies;
mod health;
mod reservations;
mod rooms;
mod users;

pub use cache::*;
pub use companies::*;
pub use health::*;
pub use reservations::*;
pub use rooms::*;
pub use users::*;

use axum::http::StatusCode;

use crate::application::companies::CompanyError;
use crate::application::repos::RepoError;
use crate::application::reservations::ReservationError;
use crate::application::rooms::RoomError;
use crate::application::users::UserError;

use super::error::ApiError;

/// Answer unknown paths with the API error body.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { ref constraint } => {
            ApiError::conflict("Duplicate record", constraint.clone())
        }
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { ref message } => {
            ApiError::bad_request("Invalid input", message.clone())
        }
        RepoError::Integrity { ref message } => {
            ApiError::conflict("Integrity constraint violated", message.clone())
        }
        RepoError::Timeout | RepoError::Persistence(_) => ApiError::internal(&err),
    }
}

fn constraint_to_api(field: &'static str) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "Request could not be processed",
        format!("invalid `{field}`"),
    )
}

pub(crate) fn reservation_to_api(err: ReservationError) -> ApiError {
    match err {
        ReservationError::ConstraintViolation(field) => constraint_to_api(field),
        ReservationError::UnknownRoom => ApiError::not_found("Room not found"),
        ReservationError::UnknownUser => ApiError::not_found("User not found"),
        ReservationError::NotPermitted => ApiError::new(
            StatusCode::FORBIDDEN,
            "User may not book this room",
            err.to_string(),
        ),
        ReservationError::Overlap => {
            ApiError::conflict("Room is already reserved", err.to_string())
        }
        ReservationError::NotFound => ApiError::not_found("Reservation not found"),
        ReservationError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn room_to_api(err: RoomError) -> ApiError {
    match err {
        RoomError::ConstraintViolation(field) => constraint_to_api(field),
        RoomError::UnknownCompany => ApiError::not_found("Company not found"),
        RoomError::NotFound => ApiError::not_found("Room not found"),
        RoomError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn company_to_api(err: CompanyError) -> ApiError {
    match err {
        CompanyError::ConstraintViolation(field) => constraint_to_api(field),
        CompanyError::Duplicate => ApiError::conflict("Company already exists", err.to_string()),
        CompanyError::NotFound => ApiError::not_found("Company not found"),
        CompanyError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn user_to_api(err: UserError) -> ApiError {
    match err {
        UserError::ConstraintViolation(field) => constraint_to_api(field),
        UserError::UnknownCompany => ApiError::not_found("Company not found"),
        UserError::Duplicate => ApiError::conflict("User already exists", err.to_string()),
        UserError::Repo(repo) => repo_to_api(repo),
    }
}
