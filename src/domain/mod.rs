//! Domain layer types and invariants.

pub mod entities;
pub mod identifier;
pub mod types;
