//! Core logic for PokeCapture.
//! Catalog fetch, capture lookup/toggle and the reconciliation between them.

pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod notice;
pub mod repo;
pub mod scope;
pub mod service;

pub use app::{auth_provider_from_config, AppContext, StartupError};
pub use auth::{AuthError, AuthProvider, AuthSession, PasswordSignInClient, StaticAuthProvider};
pub use catalog::{CatalogError, CatalogSource, HttpCatalogSource};
pub use config::{ConfigError, CoreConfig, LookupMode};
pub use error::{CoreError, CoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::capture::{CaptureRecord, CaptureRecordId, CaptureState, UserId};
pub use model::entity::{CatalogPage, Entity, EntityDetails};
pub use notice::{notice_channel, Notice, NoticeKind, NoticeSink};
pub use repo::capture_repo::{
    CaptureStore, InMemoryCaptureStore, SqliteCaptureStore, StoreError, StoreResult,
};
pub use scope::ScreenScope;
pub use service::capture_service::CaptureService;
pub use service::sync_service::CatalogSyncService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
