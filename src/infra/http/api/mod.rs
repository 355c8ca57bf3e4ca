pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::{ApiRepositories, ApiState};

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/reservation/company/{company_id}",
            get(handlers::list_company_reservations),
        )
        .route(
            "/api/reservation/user/{user_id}",
            get(handlers::list_user_reservations),
        )
        .route("/api/reservation", post(handlers::create_reservation))
        .route(
            "/api/reservation/{id}",
            delete(handlers::delete_reservation),
        )
        .route(
            "/api/rooms/company/{company_id}",
            get(handlers::list_company_rooms),
        )
        .route("/api/rooms", post(handlers::create_room))
        .route("/api/rooms/{id}", delete(handlers::delete_room))
        .route("/api/companies", post(handlers::create_company))
        .route("/api/companies/{company_id}", get(handlers::get_company))
        .route("/api/users", post(handlers::create_user))
        .route(
            "/api/users/company/{company_id}",
            get(handlers::list_company_users),
        )
        .route(
            "/api/admin/cache",
            get(handlers::cache_stats).delete(handlers::clear_cache),
        )
        .route(
            "/api/admin/cache/{namespace}",
            delete(handlers::clear_cache_namespace),
        )
        .route("/health", get(handlers::health))
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
