//! Test doubles shared by integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pokecapture_core::{
    AuthSession, CaptureRecord, CaptureRecordId, CaptureService, CaptureStore, CatalogError,
    CatalogPage, CatalogSource, CatalogSyncService, Entity, EntityDetails, InMemoryCaptureStore,
    Notice, NoticeSink, StaticAuthProvider, StoreError, StoreResult, UserId,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const BULBASAUR_URL: &str = "https://pokeapi.co/api/v2/pokemon/1/";
pub const IVYSAUR_URL: &str = "https://pokeapi.co/api/v2/pokemon/2/";

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

pub fn two_entity_page() -> CatalogPage {
    CatalogPage {
        count: 2,
        next: None,
        previous: None,
        entities: vec![
            Entity::new(1, "bulbasaur", BULBASAUR_URL),
            Entity::new(2, "ivysaur", IVYSAUR_URL),
        ],
    }
}

/// Catalog that serves a fixed page, or fails every call.
pub struct FakeCatalog {
    page: Option<CatalogPage>,
    pub fetches: AtomicUsize,
}

impl FakeCatalog {
    pub fn serving(page: CatalogPage) -> Self {
        Self {
            page: Some(page),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            page: None,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_first_page(&self) -> Result<CatalogPage, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.page
            .clone()
            .ok_or_else(|| CatalogError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
    }

    async fn fetch_page(&self, _cursor: &str) -> Result<CatalogPage, CatalogError> {
        self.fetch_first_page().await
    }

    async fn fetch_details(&self, detail_reference: &str) -> Result<EntityDetails, CatalogError> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| CatalogError::Transport("connection refused".to_string()))?;
        page.entities
            .iter()
            .find(|entity| entity.detail_reference == detail_reference)
            .map(|entity| EntityDetails {
                name: entity.name.clone(),
                height: 7,
                weight: 69,
                sprite_url: None,
            })
            .ok_or_else(|| CatalogError::Status {
                status: 404,
                body: "Not Found".to_string(),
            })
    }
}

/// In-memory store with injectable failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryCaptureStore,
    pub failing_lookups: HashSet<String>,
    pub fail_batch: bool,
    pub fail_writes: bool,
}

impl FlakyStore {
    pub fn failing_lookup_for(names: &[&str]) -> Self {
        Self {
            failing_lookups: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl CaptureStore for FlakyStore {
    async fn find_matching(
        &self,
        user_id: &UserId,
        entity_name: &str,
    ) -> StoreResult<Vec<CaptureRecord>> {
        if self.failing_lookups.contains(entity_name) {
            return Err(StoreError::Unavailable(format!("query for {entity_name} failed")));
        }
        self.inner.find_matching(user_id, entity_name).await
    }

    async fn find_captured_names(
        &self,
        user_id: &UserId,
        entity_names: &[String],
    ) -> StoreResult<HashSet<String>> {
        if self.fail_batch {
            return Err(StoreError::Unavailable("batch query failed".to_string()));
        }
        self.inner.find_captured_names(user_id, entity_names).await
    }

    async fn insert(&self, record: &CaptureRecord) -> StoreResult<CaptureRecordId> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        self.inner.insert(record).await
    }

    async fn delete_matching(&self, user_id: &UserId, entity_name: &str) -> StoreResult<usize> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        self.inner.delete_matching(user_id, entity_name).await
    }
}

pub fn signed_in_session(user_id: &str) -> Arc<AuthSession> {
    Arc::new(AuthSession::signed_in(
        Arc::new(StaticAuthProvider::new()),
        user(user_id),
    ))
}

pub fn signed_out_session() -> Arc<AuthSession> {
    Arc::new(AuthSession::new(Arc::new(StaticAuthProvider::new())))
}

pub fn sync_service(
    catalog: Arc<dyn CatalogSource>,
    store: Arc<dyn CaptureStore>,
    session: Arc<AuthSession>,
    notices: NoticeSink,
) -> CatalogSyncService {
    let captures = CaptureService::new(store, notices.clone());
    CatalogSyncService::new(catalog, captures, session, notices)
}

pub fn drain(rx: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}
