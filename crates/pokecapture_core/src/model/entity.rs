//! Catalog entity model.
//!
//! # Responsibility
//! - Define the annotated list item shown by the catalog screen.
//! - Define the extended attributes shown by the detail screen.
//!
//! # Invariants
//! - `sequence_number` is 1-based list position, not an identity from the
//!   remote catalog.
//! - `captured` starts as `false` and is only set by a successful lookup.

use serde::{Deserialize, Serialize};

/// One catalog item, annotated with the current user's capture flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// 1-based position in the fetched page.
    pub sequence_number: u32,
    /// Join key against capture records. Case-sensitive.
    pub name: String,
    /// Detail URL taken verbatim from the catalog entry.
    pub detail_reference: String,
    /// Derived per fetch, never persisted.
    pub captured: bool,
}

impl Entity {
    /// Creates an entity that has not been annotated yet.
    pub fn new(
        sequence_number: u32,
        name: impl Into<String>,
        detail_reference: impl Into<String>,
    ) -> Self {
        Self {
            sequence_number,
            name: name.into(),
            detail_reference: detail_reference.into(),
            captured: false,
        }
    }

    /// Label used by list rows, e.g. `#1 bulbasaur`.
    pub fn display_label(&self) -> String {
        format!("#{} {}", self.sequence_number, self.name)
    }
}

/// One page of the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogPage {
    /// Total number of entities known by the remote catalog.
    pub count: u64,
    /// Cursor URL for the next page, if any.
    pub next: Option<String>,
    /// Cursor URL for the previous page, if any.
    pub previous: Option<String>,
    /// Entities in remote order.
    pub entities: Vec<Entity>,
}

/// Extended attributes fetched from an entity's detail reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDetails {
    pub name: String,
    /// Remote units (decimetres).
    pub height: u32,
    /// Remote units (hectograms).
    pub weight: u32,
    /// Front sprite image URL, when the remote catalog provides one.
    pub sprite_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Entity;

    #[test]
    fn new_entity_is_not_captured() {
        let entity = Entity::new(1, "bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/");
        assert!(!entity.captured);
        assert_eq!(entity.display_label(), "#1 bulbasaur");
    }
}
