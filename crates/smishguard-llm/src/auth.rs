//! Bearer-token acquisition for the hosted model platform.
//!
//! `IamTokenProvider` exchanges the API key for an access token on every
//! call. `CachingTokenProvider` wraps any provider and reuses a token until
//! it is within the renewal margin of its expiry.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::backend::LlmError;

pub const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Lifetime assumed when the identity endpoint omits `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Tokens closer than this to expiry are renewed before use.
pub const DEFAULT_RENEWAL_MARGIN: Duration = Duration::from_secs(60);

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AccessToken {
    value: Arc<SecretString>,
    expires_at: Instant,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: Arc::new(SecretString::from(value.into())),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// True while the token stays valid for at least `margin`.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, LlmError>;

    /// Called when an endpoint rejects the last token. No-op for providers
    /// that keep nothing.
    async fn invalidate(&self) {}
}

// ── Identity endpoint ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Turn the identity endpoint's reply into a token.
///
/// Any non-2xx status, non-JSON body, or missing/empty `access_token` is an
/// authentication failure.
pub fn parse_token_response(status: u16, body: &str) -> Result<AccessToken, LlmError> {
    if !(200..300).contains(&status) {
        return Err(LlmError::Authentication(format!(
            "identity endpoint returned status {status}: {body}"
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(body).map_err(|e| {
        LlmError::Authentication(format!("identity endpoint returned invalid JSON: {e}"))
    })?;

    let token = parsed
        .access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            LlmError::Authentication("identity endpoint returned no access_token".to_string())
        })?;

    let ttl = parsed
        .expires_in
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL);

    Ok(AccessToken::new(token, ttl))
}

pub struct IamTokenProvider {
    identity_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl IamTokenProvider {
    pub fn new(identity_url: impl Into<String>, api_key: SecretString, client: reqwest::Client) -> Self {
        Self { identity_url: identity_url.into(), api_key, client }
    }
}

#[async_trait]
impl TokenProvider for IamTokenProvider {
    #[instrument(skip(self), fields(url = %self.identity_url))]
    async fn access_token(&self) -> Result<AccessToken, LlmError> {
        let resp = self
            .client
            .post(&self.identity_url)
            .form(&[
                ("apikey", self.api_key.expose_secret()),
                ("grant_type", IAM_GRANT_TYPE),
            ])
            .send()
            .await
            .map_err(|e| LlmError::Authentication(format!("identity request failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| LlmError::Authentication(format!("identity response unreadable: {e}")))?;

        parse_token_response(status, &body)
    }
}

// ── Cache ─────────────────────────────────────────────────────────────────────

/// Reuses the inner provider's token until it nears expiry. Concurrent
/// callers share one refresh.
pub struct CachingTokenProvider {
    inner: Arc<dyn TokenProvider>,
    cached: Mutex<Option<AccessToken>>,
    renewal_margin: Duration,
}

impl CachingTokenProvider {
    pub fn new(inner: Arc<dyn TokenProvider>) -> Self {
        Self::with_renewal_margin(inner, DEFAULT_RENEWAL_MARGIN)
    }

    pub fn with_renewal_margin(inner: Arc<dyn TokenProvider>, renewal_margin: Duration) -> Self {
        Self { inner, cached: Mutex::new(None), renewal_margin }
    }

}

#[async_trait]
impl TokenProvider for CachingTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, LlmError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(self.renewal_margin) {
                return Ok(token.clone());
            }
            debug!("access token near expiry, renewing");
        }

        let token = self.inner.access_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next call fetches a new one.
    async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("cached access token dropped");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
