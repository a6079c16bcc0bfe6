//! Wire shapes of the remote catalog JSON.

use crate::model::entity::{CatalogPage, Entity, EntityDetails};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct CatalogPageDto {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<CatalogEntryDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CatalogEntryDto {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct EntityDetailsDto {
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub sprites: SpritesDto,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SpritesDto {
    pub front_default: Option<String>,
}

impl CatalogPageDto {
    pub fn into_domain(self) -> CatalogPage {
        let entities = self
            .results
            .into_iter()
            .zip(1u32..)
            .map(|(entry, sequence_number)| Entity::new(sequence_number, entry.name, entry.url))
            .collect();

        CatalogPage {
            count: self.count,
            next: self.next,
            previous: self.previous,
            entities,
        }
    }
}

impl EntityDetailsDto {
    pub fn into_domain(self) -> EntityDetails {
        EntityDetails {
            name: self.name,
            height: self.height,
            weight: self.weight,
            sprite_url: self.sprites.front_default,
        }
    }
}
