//! Authentication session and sign-in providers.
//!
//! # Responsibility
//! - Hold the currently signed-in user for one app process.
//! - Delegate credential checks to an injected [`AuthProvider`].
//!
//! # Invariants
//! - Credentials are never logged or stored; only the resulting `UserId` is kept.
//! - A failed sign-in leaves the previous session untouched and publishes
//!   one `auth` notice.

use crate::error::CoreError;
use crate::model::capture::UserId;
use crate::notice::NoticeSink;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

mod password_client;
mod static_provider;

pub use password_client::PasswordSignInClient;
pub use static_provider::StaticAuthProvider;

/// Sign-in failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
    #[error("invalid identity response: {0}")]
    InvalidResponse(String),
}

/// Email/password identity backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies credentials and returns the provider's user identifier.
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError>;
}

/// Current authentication state, shared by services and UI bindings.
pub struct AuthSession {
    provider: Arc<dyn AuthProvider>,
    current: RwLock<Option<UserId>>,
    notices: NoticeSink,
}

impl AuthSession {
    /// Creates a signed-out session.
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
            notices: NoticeSink::disabled(),
        }
    }

    /// Creates a session already bound to `user_id`, e.g. restored from the
    /// platform keychain.
    pub fn signed_in(provider: Arc<dyn AuthProvider>, user_id: UserId) -> Self {
        Self {
            provider,
            current: RwLock::new(Some(user_id)),
            notices: NoticeSink::disabled(),
        }
    }

    /// Routes sign-in failures to `notices`.
    pub fn with_notices(mut self, notices: NoticeSink) -> Self {
        self.notices = notices;
        self
    }

    /// Signs in with email and password, replacing any previous user.
    ///
    /// # Errors
    /// - `MissingCredentials` when either input is blank; the provider is not called.
    /// - Provider errors unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(self.reject(AuthError::MissingCredentials));
        }

        match self.provider.sign_in(email, password).await {
            Ok(user_id) => {
                *self.current.write().await = Some(user_id.clone());
                info!("event=auth_sign_in module=auth status=ok");
                Ok(user_id)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Binds a previously issued user ID without contacting the provider.
    pub async fn restore(&self, user_id: UserId) {
        *self.current.write().await = Some(user_id);
        info!("event=auth_restore module=auth status=ok");
    }

    /// Clears the current user. Signing out twice is harmless.
    pub async fn sign_out(&self) {
        let previous = self.current.write().await.take();
        if previous.is_some() {
            info!("event=auth_sign_out module=auth status=ok");
        }
    }

    pub async fn current_user(&self) -> Option<UserId> {
        self.current.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    fn reject(&self, err: AuthError) -> AuthError {
        warn!("event=auth_sign_in module=auth status=error error={err}");
        self.notices.publish_error(&CoreError::from(err.clone()));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthError, AuthSession, StaticAuthProvider};
    use crate::notice::{notice_channel, NoticeKind};
    use std::sync::Arc;

    fn session() -> AuthSession {
        let provider = StaticAuthProvider::new().with_account("ash@example.com", "pikachu", "u1");
        AuthSession::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn sign_in_then_sign_out() {
        let session = session();
        assert!(!session.is_signed_in().await);

        let user = session.sign_in("ash@example.com", "pikachu").await.unwrap();
        assert_eq!(user.as_str(), "u1");
        assert_eq!(session.current_user().await, Some(user));

        session.sign_out().await;
        session.sign_out().await;
        assert!(!session.is_signed_in().await);
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_provider() {
        let session = session();
        let err = session.sign_in("  ", "pikachu").await.unwrap_err();
        assert_eq!(err, AuthError::MissingCredentials);
        let err = session.sign_in("ash@example.com", "").await.unwrap_err();
        assert_eq!(err, AuthError::MissingCredentials);
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_previous_user() {
        let session = session();
        session.sign_in("ash@example.com", "pikachu").await.unwrap();

        let err = session.sign_in("ash@example.com", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(
            session.current_user().await.map(|user| user.to_string()),
            Some("u1".to_string())
        );
    }

    #[tokio::test]
    async fn failed_sign_in_publishes_auth_notice() {
        let (notices, mut receiver) = notice_channel();
        let session = session().with_notices(notices);

        session.sign_in("ash@example.com", "wrong").await.unwrap_err();
        session.sign_in("", "").await.unwrap_err();
        session.sign_in("ash@example.com", "pikachu").await.unwrap();

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.kind, NoticeKind::Auth);
        assert!(first.message.contains("invalid email or password"));
        assert_eq!(receiver.try_recv().unwrap().kind, NoticeKind::Auth);
        assert!(receiver.try_recv().is_err(), "successful sign-in stays silent");
    }
}
