//! Reservation listings (read-through cached) and reservation writes.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreateReservationParams, RepoError, ReservationsRepo, RoomsRepo, UsersRepo,
};
use crate::cache::{CacheKey, ListingCache};
use crate::domain::entities::ReservationRecord;
use crate::domain::identifier::NormalizedId;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("room not found")]
    UnknownRoom,
    #[error("user not found")]
    UnknownUser,
    #[error("user may not book this room")]
    NotPermitted,
    #[error("room is already reserved for an overlapping period")]
    Overlap,
    #[error("reservation not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateReservationCommand {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub starts_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct ReservationService {
    reservations: Arc<dyn ReservationsRepo>,
    rooms: Arc<dyn RoomsRepo>,
    users: Arc<dyn UsersRepo>,
    cache: Arc<ListingCache>,
}

impl ReservationService {
    pub fn new(
        reservations: Arc<dyn ReservationsRepo>,
        rooms: Arc<dyn RoomsRepo>,
        users: Arc<dyn UsersRepo>,
        cache: Arc<ListingCache>,
    ) -> Self {
        Self {
            reservations,
            rooms,
            users,
            cache,
        }
    }

    /// Reservations for a company, served from cache when fresh.
    pub async fn list_for_company(
        &self,
        company: &str,
    ) -> Result<Arc<[ReservationRecord]>, ReservationError> {
        let company = NormalizedId::parse(company)
            .map_err(|_| ReservationError::ConstraintViolation("companyId"))?;
        let key = CacheKey::company_reservations(&company);

        if let Some(cached) = self.cache.reservations(&key) {
            return Ok(cached);
        }

        let observed = self.cache.generation();
        let fresh: Arc<[ReservationRecord]> = self
            .reservations
            .list_reservations_for_company(company.as_str())
            .await?
            .into();
        self.cache.fill_reservations(key, fresh.clone(), observed);
        Ok(fresh)
    }

    /// Reservations held by a user, served from cache when fresh.
    pub async fn list_for_user(
        &self,
        user: &str,
    ) -> Result<Arc<[ReservationRecord]>, ReservationError> {
        let user = NormalizedId::parse(user)
            .map_err(|_| ReservationError::ConstraintViolation("userId"))?;
        let user_id = Uuid::parse_str(user.as_str())
            .map_err(|_| ReservationError::ConstraintViolation("userId"))?;
        let key = CacheKey::user_reservations(&user);

        if let Some(cached) = self.cache.reservations(&key) {
            return Ok(cached);
        }

        let observed = self.cache.generation();
        let fresh: Arc<[ReservationRecord]> = self
            .reservations
            .list_reservations_for_user(user_id)
            .await?
            .into();
        self.cache.fill_reservations(key, fresh.clone(), observed);
        Ok(fresh)
    }

    pub async fn create(
        &self,
        command: CreateReservationCommand,
    ) -> Result<ReservationRecord, ReservationError> {
        let CreateReservationCommand {
            room_id,
            user_id,
            title,
            starts_at,
            ends_at,
        } = command;

        let title = title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(ReservationError::ConstraintViolation("title"));
        }
        if ends_at <= starts_at {
            return Err(ReservationError::ConstraintViolation("endsAt"));
        }

        let room = self
            .rooms
            .find_room(room_id)
            .await?
            .ok_or(ReservationError::UnknownRoom)?;
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ReservationError::UnknownUser)?;

        if user.company_slug != room.company_slug || !room.is_bookable_by(user.id) {
            return Err(ReservationError::NotPermitted);
        }

        let overlapping = self
            .reservations
            .list_overlapping(room.id, starts_at, ends_at)
            .await?;
        if !overlapping.is_empty() {
            return Err(ReservationError::Overlap);
        }

        let reservation = self
            .reservations
            .create_reservation(CreateReservationParams {
                company_slug: room.company_slug.clone(),
                room_id: room.id,
                user_id: user.id,
                title,
                starts_at,
                ends_at,
            })
            .await
            .map_err(|err| match err {
                // Exclusion constraint lost a race with a concurrent booking.
                RepoError::Integrity { .. } => ReservationError::Overlap,
                other => ReservationError::Repo(other),
            })?;

        self.invalidate_for(&reservation);
        info!(
            target = "roombook::reservations",
            reservation_id = %reservation.id,
            room_id = %reservation.room_id,
            company = %reservation.company_slug,
            "reservation created"
        );
        Ok(reservation)
    }

    pub async fn delete(&self, id: Uuid) -> Result<ReservationRecord, ReservationError> {
        let reservation = self
            .reservations
            .delete_reservation(id)
            .await?
            .ok_or(ReservationError::NotFound)?;

        self.invalidate_for(&reservation);
        info!(
            target = "roombook::reservations",
            reservation_id = %reservation.id,
            company = %reservation.company_slug,
            "reservation deleted"
        );
        Ok(reservation)
    }

    fn invalidate_for(&self, reservation: &ReservationRecord) {
        invalidate_reservation_keys(&self.cache, reservation);
    }
}

/// Drop the company and user listings a reservation appears in.
pub(crate) fn invalidate_reservation_keys(cache: &ListingCache, reservation: &ReservationRecord) {
    if let Ok(company) = NormalizedId::parse(&reservation.company_slug) {
        cache.invalidate(&CacheKey::company_reservations(&company));
    }
    if let Ok(user) = NormalizedId::parse(&reservation.user_id.to_string()) {
        cache.invalidate(&CacheKey::user_reservations(&user));
    }
}
