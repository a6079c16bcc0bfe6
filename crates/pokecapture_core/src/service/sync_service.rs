//! Catalog reconciliation: fetch a page, annotate it, hand it over whole.
//!
//! # Responsibility
//! - Sequence catalog fetch and capture lookup for the list screen.
//! - Route toggle and detail requests from the detail screen.
//!
//! # Invariants
//! - The annotated page is returned only after every entity was annotated
//!   or failed independently; there is no partial delivery.
//! - Entity order and sequence numbers match the fetched page.
//! - Without a signed-in user every entity stays `captured = false`.

use crate::auth::AuthSession;
use crate::catalog::CatalogSource;
use crate::config::LookupMode;
use crate::error::{CoreError, CoreResult};
use crate::model::capture::UserId;
use crate::model::entity::{CatalogPage, Entity, EntityDetails};
use crate::notice::NoticeSink;
use crate::service::capture_service::CaptureService;
use futures::stream::{self, StreamExt};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates catalog, capture store and auth session.
pub struct CatalogSyncService {
    catalog: Arc<dyn CatalogSource>,
    captures: CaptureService,
    session: Arc<AuthSession>,
    notices: NoticeSink,
    lookup_mode: LookupMode,
    lookup_concurrency: usize,
}

impl CatalogSyncService {
    /// Creates a service with batched lookup.
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        captures: CaptureService,
        session: Arc<AuthSession>,
        notices: NoticeSink,
    ) -> Self {
        Self {
            catalog,
            captures,
            session,
            notices,
            lookup_mode: LookupMode::Batched,
            lookup_concurrency: 1,
        }
    }

    /// Selects the lookup strategy; `concurrency` is clamped to at least 1.
    pub fn with_lookup(mut self, mode: LookupMode, concurrency: usize) -> Self {
        self.lookup_mode = mode;
        self.lookup_concurrency = concurrency.max(1);
        self
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Fetches the first catalog page and annotates every entity with the
    /// current user's capture flag.
    ///
    /// # Errors
    /// - `Network` when the catalog fetch fails; a notice is published and
    ///   the caller should keep its current list.
    ///
    /// Lookup failures never fail the call; affected entities stay `false`.
    pub async fn fetch_annotated_catalog(&self) -> CoreResult<CatalogPage> {
        let started_at = Instant::now();
        let mut page = match self.catalog.fetch_first_page().await {
            Ok(page) => page,
            Err(err) => {
                error!("event=catalog_sync module=service status=error stage=fetch error={err}");
                let err = CoreError::from(err);
                self.notices.publish_error(&err);
                return Err(err);
            }
        };

        if let Some(user_id) = self.session.current_user().await {
            self.annotate(&user_id, &mut page.entities).await;
        }

        info!(
            "event=catalog_sync module=service status=ok entities={} captured={} mode={:?} duration_ms={}",
            page.entities.len(),
            page.entities.iter().filter(|entity| entity.captured).count(),
            self.lookup_mode,
            started_at.elapsed().as_millis()
        );
        Ok(page)
    }

    /// Toggles capture for the signed-in user and returns the re-read state.
    pub async fn toggle_capture(
        &self,
        entity_name: &str,
        currently_captured: bool,
    ) -> CoreResult<bool> {
        let user_id = self.session.current_user().await;
        self.captures
            .toggle(user_id.as_ref(), entity_name, currently_captured)
            .await
    }

    /// Re-reads the capture flag of one entity for the signed-in user.
    pub async fn refresh_capture(&self, entity_name: &str) -> CoreResult<bool> {
        match self.session.current_user().await {
            Some(user_id) => self.captures.lookup(&user_id, entity_name).await,
            None => Ok(false),
        }
    }

    /// Fetches detail attributes from a catalog entry's reference.
    pub async fn entity_details(&self, detail_reference: &str) -> CoreResult<EntityDetails> {
        self.catalog
            .fetch_details(detail_reference)
            .await
            .map_err(|err| {
                let err = CoreError::from(err);
                self.notices.publish_error(&err);
                err
            })
    }

    async fn annotate(&self, user_id: &UserId, entities: &mut [Entity]) {
        match self.lookup_mode {
            LookupMode::Batched => {
                let names = entities
                    .iter()
                    .map(|entity| entity.name.clone())
                    .collect::<Vec<_>>();
                if let Ok(captured) = self.captures.lookup_many(user_id, &names).await {
                    for entity in entities.iter_mut() {
                        entity.captured = captured.contains(&entity.name);
                    }
                }
            }
            LookupMode::PerEntity => {
                let flags = stream::iter(entities.iter())
                    .map(|entity| async move {
                        self.captures
                            .lookup(user_id, &entity.name)
                            .await
                            .unwrap_or(false)
                    })
                    .buffered(self.lookup_concurrency)
                    .collect::<Vec<_>>()
                    .await;
                for (entity, captured) in entities.iter_mut().zip(flags) {
                    entity.captured = captured;
                }
            }
        }
    }
}
