// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session id. Always a UUID, but callers must treat it as
/// opaque — nothing in the wire protocol parses its structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    /// Parse a session id from its string form, e.g. one a client echoed back.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string_form() {
        let id = SessionId::new();
        let parsed = SessionId::parse(&id.as_str()).expect("valid uuid");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_non_uuid_strings() {
        assert!(SessionId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn two_new_ids_differ() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
