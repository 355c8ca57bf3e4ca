//! Application services: read-through listings and the writes that invalidate them.

pub mod companies;
pub mod error;
pub mod repos;
pub mod reservations;
pub mod rooms;
pub mod users;
