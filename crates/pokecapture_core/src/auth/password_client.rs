//! Reqwest-backed email/password sign-in against a hosted identity service.
//!
//! The endpoint accepts `{email, password, returnSecureToken}` and answers
//! with a JSON body carrying the account's `localId`.

use super::{AuthError, AuthProvider};
use crate::model::capture::UserId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
}

/// Identity-service adapter for [`AuthProvider`].
pub struct PasswordSignInClient {
    client: Client,
    endpoint: Url,
}

impl PasswordSignInClient {
    /// Builds a client for `endpoint`, appending `key=<api_key>` when given.
    ///
    /// # Errors
    /// - `Unavailable` when the endpoint does not parse or the reqwest client
    ///   cannot be built.
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, AuthError> {
        let mut endpoint = Url::parse(endpoint.trim())
            .map_err(|err| AuthError::Unavailable(format!("invalid identity endpoint: {err}")))?;
        if let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
            endpoint.query_pairs_mut().append_pair("key", key);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AuthProvider for PasswordSignInClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;
        parse_user_id(body.as_ref())
    }
}

fn map_status(status: StatusCode) -> AuthError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthError::InvalidCredentials
        }
        other => AuthError::Unavailable(format!("status {}", other.as_u16())),
    }
}

fn parse_user_id(body: &[u8]) -> Result<UserId, AuthError> {
    let decoded: SignInResponse = serde_json::from_slice(body)
        .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
    UserId::new(decoded.local_id).map_err(|err| AuthError::InvalidResponse(err.to_string()))
}
