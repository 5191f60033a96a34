//! Credential providers
//!
//! A run fetches its token once through [`CachedCredentials`] and shares the
//! provider by `Arc` with every client; the cache refreshes the token only
//! when it is about to expire.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use stackprobe_models::AuthToken;
use tokio::sync::Mutex;

use super::CredentialProvider;
use crate::error::CredentialError;

/// Rackspace cloud identity endpoint (Keystone v2 dialect)
pub const DEFAULT_IDENTITY_URL: &str = "https://identity.api.rackspacecloud.com/v2.0";

/// Pre-issued token that never needs refreshing
pub struct StaticToken(AuthToken);

impl StaticToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self(AuthToken::new(id))
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Result<AuthToken, CredentialError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Debug, Serialize)]
struct AuthBody<'a> {
    #[serde(rename = "RAX-KSKEY:apiKeyCredentials")]
    api_key_credentials: ApiKeyCredentials<'a>,
}

#[derive(Debug, Serialize)]
struct ApiKeyCredentials<'a> {
    username: &'a str,
    #[serde(rename = "apiKey")]
    api_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    id: String,
    #[serde(default)]
    expires: Option<DateTime<Utc>>,
}

/// Username + API key authentication against the identity service.
///
/// Every call performs a fresh authentication; wrap it in
/// [`CachedCredentials`] to reuse the token.
pub struct IdentityClient {
    http: reqwest::Client,
    url: String,
    username: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    async fn authenticate(&self) -> Result<AuthToken, CredentialError> {
        let url = format!("{}/tokens", self.url);
        let transport = |source| CredentialError::Transport { url: url.clone(), source };

        let request = TokenRequest {
            auth: AuthBody {
                api_key_credentials: ApiKeyCredentials {
                    username: &self.username,
                    api_key: &self.api_key,
                },
            },
        };

        let response = self.http.post(&url).json(&request).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if status != StatusCode::OK {
            return Err(CredentialError::Rejected { url, status: status.as_u16() });
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|source| CredentialError::Decode { url: url.clone(), source })?;

        tracing::debug!(expires = ?parsed.access.token.expires, "Acquired identity token");
        Ok(AuthToken {
            id: parsed.access.token.id,
            expires: parsed.access.token.expires,
        })
    }
}

#[async_trait]
impl CredentialProvider for IdentityClient {
    async fn token(&self) -> Result<AuthToken, CredentialError> {
        self.authenticate().await
    }
}

/// Caches the token of an inner provider until it is close to expiry
pub struct CachedCredentials<P> {
    inner: P,
    cached: Mutex<Option<AuthToken>>,
    refresh_margin: chrono::Duration,
}

impl<P: CredentialProvider> CachedCredentials<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
            refresh_margin: chrono::Duration::minutes(5),
        }
    }
}

#[async_trait]
impl<P: CredentialProvider> CredentialProvider for CachedCredentials<P> {
    async fn token(&self) -> Result<AuthToken, CredentialError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.expires_within(Utc::now(), self.refresh_margin) {
                return Ok(token.clone());
            }
            tracing::info!("Identity token about to expire, refreshing");
        }

        let token = self.inner.token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
