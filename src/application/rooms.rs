use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CompaniesRepo, CreateRoomParams, RepoError, RoomsRepo};
use crate::application::reservations::invalidate_reservation_keys;
use crate::cache::{CacheKey, ListingCache};
use crate::domain::entities::RoomRecord;
use crate::domain::identifier::NormalizedId;

const MAX_NAME_LEN: usize = 120;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("company not found")]
    UnknownCompany,
    #[error("room not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateRoomCommand {
    pub company: String,
    pub name: String,
    pub capacity: i32,
    pub restricted_to: Vec<Uuid>,
}

#[derive(Clone)]
pub struct RoomService {
    rooms: Arc<dyn RoomsRepo>,
    companies: Arc<dyn CompaniesRepo>,
    cache: Arc<ListingCache>,
}

impl RoomService {
    pub fn new(
        rooms: Arc<dyn RoomsRepo>,
        companies: Arc<dyn CompaniesRepo>,
        cache: Arc<ListingCache>,
    ) -> Self {
        Self {
            rooms,
            companies,
            cache,
        }
    }

    /// Rooms of a company, optionally narrowed to the ones `user` may book.
    ///
    /// The cached listing always holds every room of the company; the user
    /// filter is applied to the cached value.
    pub async fn list_for_company(
        &self,
        company: &str,
        user: Option<&str>,
    ) -> Result<Vec<RoomRecord>, RoomError> {
        let company = NormalizedId::parse(company)
            .map_err(|_| RoomError::ConstraintViolation("companyId"))?;
        let user = match user.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(
                Uuid::parse_str(&raw.to_ascii_lowercase())
                    .map_err(|_| RoomError::ConstraintViolation("userId"))?,
            ),
            None => None,
        };

        let rooms = self.all_rooms(company).await?;
        Ok(match user {
            Some(user_id) => rooms
                .iter()
                .filter(|room| room.is_bookable_by(user_id))
                .cloned()
                .collect(),
            None => rooms.to_vec(),
        })
    }

    async fn all_rooms(&self, company: NormalizedId) -> Result<Arc<[RoomRecord]>, RoomError> {
        let key = CacheKey::company_rooms(&company);
        if let Some(cached) = self.cache.rooms(&key) {
            return Ok(cached);
        }

        let observed = self.cache.generation();
        let fresh: Arc<[RoomRecord]> = self
            .rooms
            .list_rooms_for_company(company.as_str())
            .await?
            .into();
        self.cache.fill_rooms(key, fresh.clone(), observed);
        Ok(fresh)
    }

    pub async fn create(&self, command: CreateRoomCommand) -> Result<RoomRecord, RoomError> {
        let company = NormalizedId::parse(&command.company)
            .map_err(|_| RoomError::ConstraintViolation("companyId"))?;
        let name = command.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(RoomError::ConstraintViolation("name"));
        }
        if command.capacity < 1 {
            return Err(RoomError::ConstraintViolation("capacity"));
        }

        if self.companies.find_company(company.as_str()).await?.is_none() {
            return Err(RoomError::UnknownCompany);
        }

        let mut restricted_to = command.restricted_to;
        restricted_to.sort_unstable();
        restricted_to.dedup();

        let room = self
            .rooms
            .create_room(CreateRoomParams {
                company_slug: company.as_str().to_string(),
                name,
                capacity: command.capacity,
                restricted_to,
            })
            .await?;

        self.cache.invalidate(&CacheKey::company_rooms(&company));
        info!(
            target = "roombook::rooms",
            room_id = %room.id,
            company = %room.company_slug,
            "room created"
        );
        Ok(room)
    }

    /// Delete a room and its reservations, dropping every listing they appear in.
    pub async fn delete(&self, id: Uuid) -> Result<RoomRecord, RoomError> {
        let deleted = self.rooms.delete_room(id).await?.ok_or(RoomError::NotFound)?;

        if let Ok(company) = NormalizedId::parse(&deleted.room.company_slug) {
            self.cache.invalidate(&CacheKey::company_rooms(&company));
            self.cache
                .invalidate(&CacheKey::company_reservations(&company));
        }
        for reservation in &deleted.reservations {
            invalidate_reservation_keys(&self.cache, reservation);
        }

        info!(
            target = "roombook::rooms",
            room_id = %deleted.room.id,
            company = %deleted.room.company_slug,
            reservations = deleted.reservations.len(),
            "room deleted"
        );
        Ok(deleted.room)
    }
}
