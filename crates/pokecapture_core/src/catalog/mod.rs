//! Remote catalog access.
//!
//! # Responsibility
//! - Define the catalog source contract consumed by the sync service.
//! - Host the reqwest-backed adapter and its wire DTOs.
//!
//! # Invariants
//! - Adapters never retry; one call is one request.
//! - Sequence numbers are assigned from page position, starting at 1.

use crate::model::entity::{CatalogPage, EntityDetails};
use async_trait::async_trait;
use thiserror::Error;

mod dto;
mod http_source;

pub use http_source::HttpCatalogSource;

/// Catalog adapter failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid catalog payload: {0}")]
    Decode(String),
    #[error("invalid catalog reference `{0}`")]
    InvalidReference(String),
}

/// Source of catalog pages and entity details.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the first catalog page.
    async fn fetch_first_page(&self) -> Result<CatalogPage, CatalogError>;

    /// Fetches the page behind a `next`/`previous` cursor URL.
    async fn fetch_page(&self, cursor: &str) -> Result<CatalogPage, CatalogError>;

    /// Fetches extended attributes from an entity's detail reference.
    async fn fetch_details(&self, detail_reference: &str) -> Result<EntityDetails, CatalogError>;
}
