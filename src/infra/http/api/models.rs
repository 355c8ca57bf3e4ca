use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::UserRole;

// Request bodies use the same snake_case field names as the records the API
// returns. Only the rooms listing query keeps its camelCase `userId`.

#[derive(Debug, Deserialize, Serialize)]
pub struct ReservationCreateRequest {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RoomCreateRequest {
    pub company_id: String,
    pub name: String,
    pub capacity: i32,
    #[serde(default)]
    pub restricted_to: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CompanyCreateRequest {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UserCreateRequest {
    pub company_id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// `?userId=` on the company rooms listing.
#[derive(Debug, Default, Deserialize)]
pub struct RoomsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}
