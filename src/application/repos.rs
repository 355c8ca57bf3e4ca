//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CompanyRecord, ReservationRecord, RoomRecord, UserRecord};
use crate::domain::types::UserRole;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateCompanyParams {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub company_slug: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct CreateRoomParams {
    pub company_slug: String,
    pub name: String,
    pub capacity: i32,
    pub restricted_to: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateReservationParams {
    pub company_slug: String,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub starts_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
}

/// A room removed together with the reservations that referenced it.
#[derive(Debug, Clone)]
pub struct DeletedRoom {
    pub room: RoomRecord,
    pub reservations: Vec<ReservationRecord>,
}

#[async_trait]
pub trait CompaniesRepo: Send + Sync {
    async fn create_company(&self, params: CreateCompanyParams)
    -> Result<CompanyRecord, RepoError>;

    async fn find_company(&self, slug: &str) -> Result<Option<CompanyRecord>, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn list_users_for_company(&self, company_slug: &str)
    -> Result<Vec<UserRecord>, RepoError>;
}

#[async_trait]
pub trait RoomsRepo: Send + Sync {
    async fn list_rooms_for_company(&self, company_slug: &str)
    -> Result<Vec<RoomRecord>, RepoError>;

    async fn find_room(&self, id: Uuid) -> Result<Option<RoomRecord>, RepoError>;

    async fn create_room(&self, params: CreateRoomParams) -> Result<RoomRecord, RepoError>;

    /// Delete a room and every reservation in it. `None` when the room does not exist.
    async fn delete_room(&self, id: Uuid) -> Result<Option<DeletedRoom>, RepoError>;
}

#[async_trait]
pub trait ReservationsRepo: Send + Sync {
    async fn list_reservations_for_company(
        &self,
        company_slug: &str,
    ) -> Result<Vec<ReservationRecord>, RepoError>;

    async fn list_reservations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, RepoError>;

    /// Reservations in `room_id` whose interval intersects `[starts_at, ends_at)`.
    async fn list_overlapping(
        &self,
        room_id: Uuid,
        starts_at: OffsetDateTime,
        ends_at: OffsetDateTime,
    ) -> Result<Vec<ReservationRecord>, RepoError>;

    async fn create_reservation(
        &self,
        params: CreateReservationParams,
    ) -> Result<ReservationRecord, RepoError>;

    /// `None` when the reservation does not exist.
    async fn delete_reservation(&self, id: Uuid) -> Result<Option<ReservationRecord>, RepoError>;
}

/// Liveness check for the backing store.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
