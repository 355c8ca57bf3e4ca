//! In-memory repositories and router helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::sync::oneshot;
use tower::ServiceExt;
use uuid::Uuid;

use roombook::application::repos::{
    CompaniesRepo, CreateCompanyParams, CreateReservationParams, CreateRoomParams,
    CreateUserParams, DeletedRoom, HealthProbe, RepoError, ReservationsRepo, RoomsRepo, UsersRepo,
};
use roombook::cache::{CacheConfig, ListingCache, ManualClock};
use roombook::domain::entities::{CompanyRecord, ReservationRecord, RoomRecord, UserRecord};
use roombook::infra::http::{ApiRepositories, ApiState, build_router};

#[derive(Default)]
struct Tables {
    companies: HashMap<String, CompanyRecord>,
    users: HashMap<Uuid, UserRecord>,
    rooms: HashMap<Uuid, RoomRecord>,
    reservations: HashMap<Uuid, ReservationRecord>,
}

/// Counts of listing queries that reached the store.
#[derive(Default)]
pub struct QueryCounts {
    pub company_reservations: AtomicUsize,
    pub user_reservations: AtomicUsize,
    pub company_rooms: AtomicUsize,
}

impl QueryCounts {
    pub fn company_reservations(&self) -> usize {
        self.company_reservations.load(Ordering::SeqCst)
    }

    pub fn user_reservations(&self) -> usize {
        self.user_reservations.load(Ordering::SeqCst)
    }

    pub fn company_rooms(&self) -> usize {
        self.company_rooms.load(Ordering::SeqCst)
    }
}

/// Test-side handles for a listing query held open mid-flight.
pub struct PausedListing {
    /// Resolves once the query has read its rows.
    pub fetched: oneshot::Receiver<()>,
    /// Send to let the query return.
    pub resume: oneshot::Sender<()>,
}

struct ListingHold {
    fetched: oneshot::Sender<()>,
    resume: oneshot::Receiver<()>,
}

#[derive(Default)]
pub struct InMemoryRepos {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    rooms_hold: Mutex<Option<ListingHold>>,
    pub queries: QueryCounts,
}

impl InMemoryRepos {
    /// Make every read fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold the next company rooms listing after it has read its rows.
    pub fn pause_next_rooms_listing(&self) -> PausedListing {
        let (fetched_tx, fetched_rx) = oneshot::channel();
        let (resume_tx, resume_rx) = oneshot::channel();
        *self.rooms_hold.lock().expect("hold lock") = Some(ListingHold {
            fetched: fetched_tx,
            resume: resume_rx,
        });
        PausedListing {
            fetched: fetched_rx,
            resume: resume_tx,
        }
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepoError::Persistence("document store unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("tables lock")
    }
}

fn sorted_reservations(mut items: Vec<ReservationRecord>) -> Vec<ReservationRecord> {
    items.sort_by_key(|r| (r.starts_at, r.id));
    items
}

#[async_trait]
impl CompaniesRepo for InMemoryRepos {
    async fn create_company(
        &self,
        params: CreateCompanyParams,
    ) -> Result<CompanyRecord, RepoError> {
        let mut tables = self.tables();
        if tables.companies.contains_key(&params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "companies_slug_key".into(),
            });
        }
        let company = CompanyRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            name: params.name,
            created_at: OffsetDateTime::now_utc(),
        };
        tables
            .companies
            .insert(company.slug.clone(), company.clone());
        Ok(company)
    }

    async fn find_company(&self, slug: &str) -> Result<Option<CompanyRecord>, RepoError> {
        self.check()?;
        Ok(self.tables().companies.get(slug).cloned())
    }
}

#[async_trait]
impl UsersRepo for InMemoryRepos {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables();
        let user = UserRecord {
            id: Uuid::new_v4(),
            company_slug: params.company_slug,
            email: params.email,
            display_name: params.display_name,
            role: params.role,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        self.check()?;
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn list_users_for_company(
        &self,
        company_slug: &str,
    ) -> Result<Vec<UserRecord>, RepoError> {
        self.check()?;
        let mut users: Vec<_> = self
            .tables()
            .users
            .values()
            .filter(|u| u.company_slug == company_slug)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(users)
    }
}

#[async_trait]
impl RoomsRepo for InMemoryRepos {
    async fn list_rooms_for_company(
        &self,
        company_slug: &str,
    ) -> Result<Vec<RoomRecord>, RepoError> {
        self.queries.company_rooms.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rooms: Vec<_> = self
            .tables()
            .rooms
            .values()
            .filter(|r| r.company_slug == company_slug)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));

        let hold = self.rooms_hold.lock().expect("hold lock").take();
        if let Some(hold) = hold {
            let _ = hold.fetched.send(());
            let _ = hold.resume.await;
        }
        Ok(rooms)
    }

    async fn find_room(&self, id: Uuid) -> Result<Option<RoomRecord>, RepoError> {
        self.check()?;
        Ok(self.tables().rooms.get(&id).cloned())
    }

    async fn create_room(&self, params: CreateRoomParams) -> Result<RoomRecord, RepoError> {
        let room = RoomRecord {
            id: Uuid::new_v4(),
            company_slug: params.company_slug,
            name: params.name,
            capacity: params.capacity,
            restricted_to: params.restricted_to,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables().rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn delete_room(&self, id: Uuid) -> Result<Option<DeletedRoom>, RepoError> {
        let mut tables = self.tables();
        let Some(room) = tables.rooms.remove(&id) else {
            return Ok(None);
        };
        let removed: Vec<Uuid> = tables
            .reservations
            .values()
            .filter(|r| r.room_id == id)
            .map(|r| r.id)
            .collect();
        let reservations = removed
            .into_iter()
            .filter_map(|rid| tables.reservations.remove(&rid))
            .collect();
        Ok(Some(DeletedRoom { room, reservations }))
    }
}

#[async_trait]
impl ReservationsRepo for InMemoryRepos {
    async fn list_reservations_for_company(
        &self,
        company_slug: &str,
    ) -> Result<Vec<ReservationRecord>, RepoError> {
        self.queries
            .company_reservations
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(sorted_reservations(
            self.tables()
                .reservations
                .values()
                .filter(|r| r.company_slug == company_slug)
                .cloned()
                .collect(),
        ))
    }

    async fn list_reservations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, RepoError> {
        self.queries.user_reservations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(sorted_reservations(
            self.tables()
                .reservations
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_overlapping(
        &self,
        room_id: Uuid,
        starts_at: OffsetDateTime,
        ends_at: OffsetDateTime,
    ) -> Result<Vec<ReservationRecord>, RepoError> {
        self.check()?;
        Ok(sorted_reservations(
            self.tables()
                .reservations
                .values()
                .filter(|r| r.room_id == room_id && r.overlaps(starts_at, ends_at))
                .cloned()
                .collect(),
        ))
    }

    async fn create_reservation(
        &self,
        params: CreateReservationParams,
    ) -> Result<ReservationRecord, RepoError> {
        let reservation = ReservationRecord {
            id: Uuid::new_v4(),
            company_slug: params.company_slug,
            room_id: params.room_id,
            user_id: params.user_id,
            title: params.title,
            starts_at: params.starts_at,
            ends_at: params.ends_at,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables()
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn delete_reservation(&self, id: Uuid) -> Result<Option<ReservationRecord>, RepoError> {
        Ok(self.tables().reservations.remove(&id))
    }
}

#[async_trait]
impl HealthProbe for InMemoryRepos {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check()
    }
}

/// A router over fresh in-memory repositories and a manually driven cache clock.
pub struct TestApp {
    pub repos: Arc<InMemoryRepos>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<ListingCache>,
    pub state: ApiState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let repos = Arc::new(InMemoryRepos::default());
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(ListingCache::with_clock(config, clock.clone()));
        let state = ApiState::new(
            ApiRepositories {
                companies: repos.clone(),
                users: repos.clone(),
                rooms: repos.clone(),
                reservations: repos.clone(),
                health: repos.clone(),
            },
            cache.clone(),
        );
        let router = build_router(state.clone());
        Self {
            repos,
            clock,
            cache,
            state,
            router,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response")
    }

    /// Issue a GET on its own task, for interleaving with other requests.
    pub fn spawn_get(&self, uri: &str) -> tokio::task::JoinHandle<Response<Body>> {
        let router = self.router.clone();
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        tokio::spawn(async move { router.oneshot(request).await.expect("router response") })
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Method::GET, uri, None).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.get(uri).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.request(Method::POST, uri, Some(body)).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        self.request(Method::DELETE, uri, None).await.status()
    }

    /// Seed a company with one member and one open room through the API.
    pub async fn seed(&self, company_name: &str) -> Seed {
        let (status, company) = self
            .post_json("/api/companies", serde_json::json!({ "name": company_name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "company: {company}");
        let slug = company["slug"].as_str().expect("slug").to_string();

        let (status, user) = self
            .post_json(
                "/api/users",
                serde_json::json!({
                    "company_id": slug,
                    "email": "ola@example.com",
                    "display_name": "Ola Nordmann",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "user: {user}");

        let (status, room) = self
            .post_json(
                "/api/rooms",
                serde_json::json!({
                    "company_id": slug,
                    "name": "Fjord",
                    "capacity": 6,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "room: {room}");

        Seed {
            company: slug,
            user_id: parse_id(&user),
            room_id: parse_id(&room),
        }
    }

    pub async fn book(&self, seed: &Seed, starts_in_hours: i64, title: &str) -> (StatusCode, Value) {
        let starts_at = base_time() + TimeDuration::hours(starts_in_hours);
        let ends_at = starts_at + TimeDuration::hours(1);
        self.post_json(
            "/api/reservation",
            serde_json::json!({
                "room_id": seed.room_id,
                "user_id": seed.user_id,
                "title": title,
                "starts_at": rfc3339(starts_at),
                "ends_at": rfc3339(ends_at),
            }),
        )
        .await
    }
}

pub struct Seed {
    pub company: String,
    pub user_id: Uuid,
    pub room_id: Uuid,
}

pub fn parse_id(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("record id")
}

pub fn base_time() -> OffsetDateTime {
    time::macros::datetime!(2030-01-07 09:00 UTC)
}

pub fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&time::format_description::well_known::Rfc3339)
        .expect("rfc3339")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    }
}
