//! Cache key definitions.
//!
//! Every key is a `(Namespace, NormalizedId)` pair rendered as
//! `{namespace}:{identifier}`. Keys are only constructed through this module so
//! two resource types can never share a key.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::domain::identifier::{IdentifierError, NormalizedId};

const DELIMITER: char = ':';

/// Closed set of cached listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Namespace {
    /// Reservations scoped to one company.
    CompanyReservations,
    /// Reservations held by one user.
    UserReservations,
    /// Rooms owned by one company.
    CompanyRooms,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::CompanyReservations,
        Namespace::UserReservations,
        Namespace::CompanyRooms,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::CompanyReservations => "company-reservations",
            Namespace::UserReservations => "user-reservations",
            Namespace::CompanyRooms => "company-rooms",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = KeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == value)
            .ok_or_else(|| KeyError::UnknownNamespace(value.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("cache key `{0}` is missing the `:` delimiter")]
    MissingDelimiter(String),
    #[error("unknown cache namespace `{0}`")]
    UnknownNamespace(String),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// A namespaced cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: Namespace,
    identifier: NormalizedId,
}

impl CacheKey {
    pub fn new(namespace: Namespace, identifier: NormalizedId) -> Self {
        Self {
            namespace,
            identifier,
        }
    }

    pub fn company_reservations(company: &NormalizedId) -> Self {
        Self::new(Namespace::CompanyReservations, company.clone())
    }

    pub fn user_reservations(user: &NormalizedId) -> Self {
        Self::new(Namespace::UserReservations, user.clone())
    }

    pub fn company_rooms(company: &NormalizedId) -> Self {
        Self::new(Namespace::CompanyRooms, company.clone())
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn identifier(&self) -> &NormalizedId {
        &self.identifier
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.namespace, self.identifier)
    }
}

impl FromStr for CacheKey {
    type Err = KeyError;

    /// Parse the rendered form; the identifier part is normalized again.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (namespace, identifier) = value
            .split_once(DELIMITER)
            .ok_or_else(|| KeyError::MissingDelimiter(value.to_string()))?;
        Ok(Self::new(
            namespace.parse()?,
            NormalizedId::parse(identifier)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> NormalizedId {
        NormalizedId::parse(raw).expect("valid identifier")
    }

    #[test]
    fn key_renders_namespace_and_identifier() {
        let key = CacheKey::company_reservations(&id("Acme Corp"));
        assert_eq!(key.to_string(), "company-reservations:acme-corp");
    }

    #[test]
    fn identical_queries_produce_identical_keys() {
        let a = CacheKey::company_rooms(&id("acme   corp"));
        let b = CacheKey::company_rooms(&id("ACME-CORP"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn namespaces_keep_same_identifier_apart() {
        let company = id("acme-corp");
        let reservations = CacheKey::company_reservations(&company);
        let rooms = CacheKey::company_rooms(&company);
        let user = CacheKey::user_reservations(&company);

        assert_ne!(reservations, rooms);
        assert_ne!(reservations, user);
        assert_ne!(rooms.to_string(), user.to_string());
    }

    #[test]
    fn rendered_key_parses_back() {
        let key: CacheKey = "user-reservations:Ola Nordmann".parse().expect("parse");
        assert_eq!(key.namespace(), Namespace::UserReservations);
        assert_eq!(key.identifier().as_str(), "ola-nordmann");
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(
            "company-reservations".parse::<CacheKey>(),
            Err(KeyError::MissingDelimiter(_))
        ));
        assert!(matches!(
            "bookings:acme".parse::<CacheKey>(),
            Err(KeyError::UnknownNamespace(_))
        ));
        assert_eq!(
            "company-rooms:   ".parse::<CacheKey>(),
            Err(KeyError::Identifier(IdentifierError::Empty))
        );
    }
}
