//! Credentials providers.
//!
//! The client asks its [`CredentialsProvider`] for HTTP headers immediately
//! before every SOAP call, so a provider that refreshes tokens is observed
//! on the next request without any coordination.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Request};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ClientError;
use crate::transport::{HyperTransport, RequestBody};

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_OAUTH2_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/token";

/// Tokens closer than this to expiry are refreshed before use.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Produces the HTTP headers that authenticate a request.
///
/// Implementations must be safe to call concurrently; each call should
/// return headers that are valid right now.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn http_headers(&self) -> Result<HeaderMap, ClientError>;
}

#[async_trait]
impl<T: CredentialsProvider + ?Sized> CredentialsProvider for Arc<T> {
    async fn http_headers(&self) -> Result<HeaderMap, ClientError> {
        (**self).http_headers().await
    }
}

/// A fixed bearer token.
#[derive(Clone)]
pub struct AccessTokenCredentials {
    header: HeaderValue,
}

impl AccessTokenCredentials {
    pub fn new(access_token: &str) -> Result<Self, ClientError> {
        Ok(Self {
            header: bearer(access_token)?,
        })
    }
}

impl fmt::Debug for AccessTokenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenCredentials").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialsProvider for AccessTokenCredentials {
    async fn http_headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.header.clone());
        Ok(headers)
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    header: HeaderValue,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at
            .is_none_or(|expires_at| now + REFRESH_MARGIN < expires_at)
    }
}

/// OAuth 2.0 installed-application credentials.
///
/// Exchanges the refresh token for an access token on first use and again
/// whenever the cached token is within [`REFRESH_MARGIN`] of expiring.
/// Concurrent callers share one refresh.
pub struct RefreshTokenCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
    transport: HyperTransport,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for RefreshTokenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenCredentials")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl RefreshTokenCredentials {
    /// Create credentials that refresh against Google's token endpoint.
    pub fn new<S: Into<String>>(client_id: S, client_secret: S, refresh_token: S) -> Result<Self, ClientError> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            token_uri: GOOGLE_OAUTH2_ENDPOINT.to_string(),
            transport: HyperTransport::new()?,
            cached: Mutex::new(None),
        })
    }

    /// Use a different token endpoint.
    pub fn with_token_uri<S: Into<String>>(mut self, token_uri: S) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Use a specific transport, e.g. one that goes through a proxy.
    pub fn with_transport(mut self, transport: HyperTransport) -> Self {
        self.transport = transport;
        self
    }

    async fn refresh(&self) -> Result<CachedToken, ClientError> {
        let form = serde_qs::to_string(&RefreshRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            refresh_token: &self.refresh_token,
            grant_type: "refresh_token",
        })
        .map_err(|e| ClientError::Credentials(format!("encoding token request failed: {e}")))?;

        let request = Request::post(&self.token_uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(RequestBody::new(Bytes::from(form)))
            .map_err(|e| ClientError::Credentials(format!("invalid token endpoint: {e}")))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(token_uri = %self.token_uri, "refreshing OAuth2 access token");

        let requested_at = Instant::now();
        let response = self.transport.send(request).await?;
        let status = response.status();
        let body = response.into_body();

        if !status.is_success() {
            let reason = serde_json::from_slice::<TokenError>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ClientError::Credentials(format!(
                "token refresh failed with HTTP {}: {}",
                status.as_u16(),
                reason
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::Credentials(format!("invalid token response: {e}")))?;
        Ok(CachedToken {
            header: bearer(&token.access_token)?,
            expires_at: token
                .expires_in
                .map(|secs| requested_at + Duration::from_secs(secs)),
        })
    }
}

#[async_trait]
impl CredentialsProvider for RefreshTokenCredentials {
    async fn http_headers(&self) -> Result<HeaderMap, ClientError> {
        let mut cached = self.cached.lock().await;
        let fresh = cached
            .as_ref()
            .is_some_and(|token| token.is_fresh(Instant::now()));
        if !fresh {
            *cached = Some(self.refresh().await?);
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = cached.as_ref() {
            headers.insert(AUTHORIZATION, token.header.clone());
        }
        Ok(headers)
    }
}

fn bearer(token: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ClientError::Credentials("access token contains invalid characters".into()))?;
    value.set_sensitive(true);
    Ok(value)
}
