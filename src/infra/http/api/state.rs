use std::sync::Arc;

use crate::application::companies::CompanyService;
use crate::application::repos::{
    CompaniesRepo, HealthProbe, ReservationsRepo, RoomsRepo, UsersRepo,
};
use crate::application::reservations::ReservationService;
use crate::application::rooms::RoomService;
use crate::application::users::UserService;
use crate::cache::ListingCache;

#[derive(Clone)]
pub struct ApiState {
    pub reservations: Arc<ReservationService>,
    pub rooms: Arc<RoomService>,
    pub companies: Arc<CompanyService>,
    pub users: Arc<UserService>,
    pub cache: Arc<ListingCache>,
    pub health: Arc<dyn HealthProbe>,
}

/// Repository handles the API services are built from.
#[derive(Clone)]
pub struct ApiRepositories {
    pub companies: Arc<dyn CompaniesRepo>,
    pub users: Arc<dyn UsersRepo>,
    pub rooms: Arc<dyn RoomsRepo>,
    pub reservations: Arc<dyn ReservationsRepo>,
    pub health: Arc<dyn HealthProbe>,
}

impl ApiState {
    /// Wire every service against `repos`, sharing one listing cache.
    pub fn new(repos: ApiRepositories, cache: Arc<ListingCache>) -> Self {
        let ApiRepositories {
            companies,
            users,
            rooms,
            reservations,
            health,
        } = repos;

        Self {
            reservations: Arc::new(ReservationService::new(
                reservations,
                rooms.clone(),
                users.clone(),
                cache.clone(),
            )),
            rooms: Arc::new(RoomService::new(rooms, companies.clone(), cache.clone())),
            companies: Arc::new(CompanyService::new(companies.clone())),
            users: Arc::new(UserService::new(users, companies)),
            cache,
            health,
        }
    }
}
