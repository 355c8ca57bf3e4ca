//! Normalization of resource identifiers taken from request paths.
//!
//! Company and user identifiers arrive in whatever form a client typed them.
//! Before they are used as a query or as part of a cache key they are trimmed,
//! internal whitespace runs are collapsed to a single `-`, and the result is
//! lower-cased, so `"Acme Corp"`, `"acme   corp"` and `"ACME-CORP"` all become
//! `acme-corp`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

const SEPARATOR: char = '-';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
}

/// An identifier that has been through [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedId(String);

impl NormalizedId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim, collapse whitespace runs to `-`, lower-case.
pub fn normalize(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    for (index, word) in raw.split_whitespace().enumerate() {
        if index > 0 {
            output.push(SEPARATOR);
        }
        output.extend(word.chars().flat_map(char::to_lowercase));
    }
    output
}
