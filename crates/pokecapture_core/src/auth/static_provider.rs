//! In-process credential table for local runs and tests.

use super::{AuthError, AuthProvider};
use crate::model::capture::UserId;
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user_id: UserId,
}

/// Auth provider backed by a fixed email → (password, user) table.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthProvider {
    accounts: HashMap<String, Account>,
}

impl StaticAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one account. Email lookup is case-insensitive; blank user IDs
    /// are skipped.
    pub fn with_account(
        mut self,
        email: &str,
        password: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        if let Ok(user_id) = UserId::new(user_id) {
            self.accounts.insert(
                email.trim().to_ascii_lowercase(),
                Account {
                    password: password.into(),
                    user_id,
                },
            );
        }
        self
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        match self.accounts.get(&email.trim().to_ascii_lowercase()) {
            Some(account) if account.password == password => Ok(account.user_id.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}
