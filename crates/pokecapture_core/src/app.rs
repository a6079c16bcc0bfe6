//! Explicit construction of the service graph from configuration.
//!
//! # Responsibility
//! - Build catalog source, capture store, auth session and sync service
//!   once, at startup, and hand them out by `Arc`.
//!
//! # Invariants
//! - No adapter is reachable through a global; callers own the context.
//! - `shutdown()` signs the user out of the in-process session only.

use crate::auth::{AuthError, AuthProvider, AuthSession, PasswordSignInClient, StaticAuthProvider};
use crate::catalog::{CatalogError, HttpCatalogSource};
use crate::config::{ConfigError, CoreConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::notice::{notice_channel, Notice, NoticeSink};
use crate::repo::capture_repo::{CaptureStore, SqliteCaptureStore};
use crate::service::capture_service::CaptureService;
use crate::service::sync_service::CatalogSyncService;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// Startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("capture store: {0}")]
    Store(#[from] DbError),
    #[error("auth provider: {0}")]
    Auth(#[from] AuthError),
}

/// Owned service graph for one app process.
pub struct AppContext {
    config: CoreConfig,
    session: Arc<AuthSession>,
    sync: Arc<CatalogSyncService>,
}

impl AppContext {
    /// Builds every service from `config`.
    ///
    /// Returns the context plus the receiving end of the notice stream.
    pub fn start(
        config: CoreConfig,
        provider: Arc<dyn AuthProvider>,
    ) -> Result<(Self, UnboundedReceiver<Notice>), StartupError> {
        config.validate()?;
        let (notices, receiver) = notice_channel();
        let store = open_store(&config)?;
        let context = Self::with_store(config, provider, store, notices)?;
        Ok((context, receiver))
    }

    /// Builds the graph around a caller-provided store and notice sink.
    pub fn with_store(
        config: CoreConfig,
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn CaptureStore>,
        notices: NoticeSink,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        let catalog = HttpCatalogSource::new(&config.catalog_base_url, config.request_timeout)?;
        let session = Arc::new(AuthSession::new(provider).with_notices(notices.clone()));
        let captures = CaptureService::new(store, notices.clone());
        let sync = CatalogSyncService::new(Arc::new(catalog), captures, Arc::clone(&session), notices)
            .with_lookup(config.lookup_mode, config.lookup_concurrency);

        info!(
            "event=app_context_start module=app status=ok store={} lookup_mode={:?}",
            if config.store_path.is_some() { "file" } else { "memory" },
            config.lookup_mode
        );
        Ok(Self {
            config,
            session,
            sync: Arc::new(sync),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn session(&self) -> Arc<AuthSession> {
        Arc::clone(&self.session)
    }

    pub fn sync(&self) -> Arc<CatalogSyncService> {
        Arc::clone(&self.sync)
    }

    pub async fn shutdown(&self) {
        self.session.sign_out().await;
        info!("event=app_context_shutdown module=app status=ok");
    }
}

/// Chooses the sign-in backend described by `config`.
///
/// Falls back to an empty [`StaticAuthProvider`] (every sign-in rejected)
/// when no identity endpoint is configured.
pub fn auth_provider_from_config(config: &CoreConfig) -> Result<Arc<dyn AuthProvider>, AuthError> {
    match config.identity_endpoint.as_deref() {
        Some(endpoint) => Ok(Arc::new(PasswordSignInClient::new(
            endpoint,
            config.identity_api_key.as_deref(),
            config.request_timeout,
        )?)),
        None => Ok(Arc::new(StaticAuthProvider::new())),
    }
}

fn open_store(config: &CoreConfig) -> Result<Arc<dyn CaptureStore>, DbError> {
    let conn = match &config.store_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    Ok(Arc::new(SqliteCaptureStore::new(conn)))
}
