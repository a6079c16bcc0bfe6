//! Top-level failure taxonomy shared by services and the FFI layer.
//!
//! # Invariants
//! - Each variant carries a human-readable message suitable for a notice.
//! - Source errors from adapters are flattened to text at this boundary.

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::notice::NoticeKind;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Use-case level error returned by core services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Catalog transport failure or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),
    /// Capture lookup query failed.
    #[error("capture lookup failed: {0}")]
    Lookup(String),
    /// Capture write (insert or delete) failed.
    #[error("capture toggle failed: {0}")]
    Toggle(String),
    /// Toggle attempted without a signed-in user.
    #[error("sign in to capture entities")]
    AuthRequired,
    /// Sign-in attempt failed.
    #[error("sign in failed: {0}")]
    Auth(String),
    /// Owning screen scope was closed before the result arrived.
    #[error("operation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Notice category for this error, or `None` for silent cancellation.
    pub fn notice_kind(&self) -> Option<NoticeKind> {
        match self {
            Self::Network(_) => Some(NoticeKind::Network),
            Self::Lookup(_) => Some(NoticeKind::Lookup),
            Self::Toggle(_) => Some(NoticeKind::Toggle),
            Self::AuthRequired => Some(NoticeKind::AuthRequired),
            Self::Auth(_) => Some(NoticeKind::Auth),
            Self::Cancelled => None,
        }
    }

    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network_error",
            Self::Lookup(_) => "lookup_error",
            Self::Toggle(_) => "toggle_error",
            Self::AuthRequired => "auth_required",
            Self::Auth(_) => "auth_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<CatalogError> for CoreError {
    fn from(value: CatalogError) -> Self {
        Self::Network(value.to_string())
    }
}

impl From<AuthError> for CoreError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value.to_string())
    }
}
