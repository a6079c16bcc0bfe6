//! Capture record model.
//!
//! # Responsibility
//! - Define the document asserting a (user, entity) capture relationship.
//! - Define the two-state capture lifecycle used by the toggle path.
//!
//! # Invariants
//! - A record carries no payload beyond its keys; existence is the signal.
//! - At most one record per (user, entity) is expected but not enforced;
//!   release removes every match.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;

/// Document ID assigned to a capture record on insert.
pub type CaptureRecordId = Uuid;

/// Returned when a user identifier is blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("user id must not be blank")]
pub struct InvalidUserId;

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a provider-issued identifier. Surrounding whitespace is kept;
    /// identifiers compare exactly.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidUserId> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(InvalidUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored document linking one user to one captured entity name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: CaptureRecordId,
    pub entity_name: String,
    pub user_id: UserId,
}

impl CaptureRecord {
    /// Creates a record with a freshly generated document ID.
    pub fn new(user_id: UserId, entity_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_name: entity_name.into(),
            user_id,
        }
    }

    /// Exact, case-sensitive match on both keys.
    pub fn matches(&self, user_id: &UserId, entity_name: &str) -> bool {
        self.user_id == *user_id && self.entity_name == entity_name
    }
}

/// Capture lifecycle for one (user, entity) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// No matching record exists.
    Released,
    /// At least one matching record exists.
    Captured,
}

impl CaptureState {
    pub fn from_captured(captured: bool) -> Self {
        if captured {
            Self::Captured
        } else {
            Self::Released
        }
    }

    pub fn is_captured(self) -> bool {
        matches!(self, Self::Captured)
    }

    /// Target state of a toggle action.
    pub fn toggled(self) -> Self {
        match self {
            Self::Released => Self::Captured,
            Self::Captured => Self::Released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptureRecord, CaptureState, UserId};

    #[test]
    fn user_id_rejects_blank_values() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
        assert_eq!(UserId::new("u1").unwrap().as_str(), "u1");
    }

    #[test]
    fn record_match_is_case_sensitive() {
        let user = UserId::new("u1").unwrap();
        let record = CaptureRecord::new(user.clone(), "bulbasaur");
        assert!(record.matches(&user, "bulbasaur"));
        assert!(!record.matches(&user, "Bulbasaur"));
        assert!(!record.matches(&UserId::new("U1").unwrap(), "bulbasaur"));
    }

    #[test]
    fn state_toggles_between_two_values() {
        assert_eq!(CaptureState::Released.toggled(), CaptureState::Captured);
        assert_eq!(CaptureState::Captured.toggled(), CaptureState::Released);
        assert!(CaptureState::from_captured(true).is_captured());
    }
}
