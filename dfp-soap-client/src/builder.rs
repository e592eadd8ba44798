//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`DfpClient`].

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use rustls::ClientConfig;

use crate::cache::DescriptionCache;
use crate::client::DfpClient;
use crate::credentials::CredentialsProvider;
use crate::error::ClientError;
use crate::header::{HeaderHandler, validate_application_name};
use crate::transport::{DEFAULT_TIMEOUT, HyperTransport};

/// Builder for creating a [`DfpClient`].
///
/// # Example
///
/// ```ignore
/// use dfp_soap_client::{AccessTokenCredentials, DfpClient, InMemoryCache};
/// use std::sync::Arc;
///
/// let client = DfpClient::builder(AccessTokenCredentials::new("ya29...")?, "Acme Trafficker")
///     .network_code("1234")
///     .cache(Arc::new(InMemoryCache::new()))
///     .enable_compression(true)
///     .build()?;
/// ```
pub struct DfpClientBuilder {
    /// Source of the Authorization header.
    credentials: Arc<dyn CredentialsProvider>,
    /// Identifies the calling application; must not be the placeholder.
    application_name: String,
    /// Network to act on; absent for network-agnostic calls.
    network_code: Option<String>,
    /// Proxy every connection is tunnelled through.
    https_proxy: Option<String>,
    /// Cache for fetched service descriptions.
    cache: Option<Arc<dyn DescriptionCache>>,
    /// Ask for gzip-compressed responses.
    enable_compression: bool,
    /// Extra headers sent with every request, validated in `build`.
    custom_http_headers: Vec<(String, String)>,
    /// Per-request timeout.
    timeout: Duration,
    /// Custom TLS configuration.
    tls_config: Option<ClientConfig>,
}

impl std::fmt::Debug for DfpClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DfpClientBuilder")
            .field("application_name", &self.application_name)
            .field("network_code", &self.network_code)
            .field("https_proxy", &self.https_proxy.is_some())
            .field("cache", &self.cache.is_some())
            .field("enable_compression", &self.enable_compression)
            .field("custom_http_headers", &self.custom_http_headers.len())
            .field("timeout", &self.timeout)
            .field("tls_config", &self.tls_config.is_some())
            .finish_non_exhaustive()
    }
}

impl DfpClientBuilder {
    /// Create a builder with the required settings.
    pub fn new<C, S>(credentials: C, application_name: S) -> Self
    where
        C: CredentialsProvider + 'static,
        S: Into<String>,
    {
        Self {
            credentials: Arc::new(credentials),
            application_name: application_name.into(),
            network_code: None,
            https_proxy: None,
            cache: None,
            enable_compression: false,
            custom_http_headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            tls_config: None,
        }
    }

    pub fn network_code<S: Into<String>>(mut self, network_code: S) -> Self {
        self.network_code = Some(network_code.into());
        self
    }

    /// Tunnel all connections through this proxy.
    ///
    /// Accepts `host:port` or `http://[user:password@]host:port`.
    pub fn https_proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.https_proxy = Some(proxy.into());
        self
    }

    /// Consult `cache` before fetching a service description.
    pub fn cache(mut self, cache: Arc<dyn DescriptionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Request gzip-compressed responses.
    ///
    /// Default: off.
    pub fn enable_compression(mut self, enable: bool) -> Self {
        self.enable_compression = enable;
        self
    }

    /// Add a header to every request.
    ///
    /// May be called repeatedly; repeated names send every value.
    pub fn custom_http_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.custom_http_headers.push((name.into(), value.into()));
        self
    }

    /// Set the per-request timeout.
    ///
    /// Default: one hour, enough for the largest service descriptions.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom TLS configuration.
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// `MisconfiguredApplicationName` for an empty or placeholder
    /// application name, `Config` for an invalid proxy or header.
    pub fn build(self) -> Result<DfpClient, ClientError> {
        validate_application_name(&self.application_name)?;

        let mut custom_http_headers = HeaderMap::new();
        for (name, value) in &self.custom_http_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| ClientError::config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| ClientError::config(format!("invalid value for header {name}: {e}")))?;
            custom_http_headers.append(name, value);
        }

        let mut transport = HyperTransport::builder().timeout(self.timeout);
        if let Some(config) = self.tls_config {
            transport = transport.tls_config(config);
        }
        if let Some(proxy) = &self.https_proxy {
            transport = transport.https_proxy(proxy.as_str());
        }
        let transport = transport.build()?;

        let header = HeaderHandler::new(
            self.credentials,
            self.application_name,
            self.network_code,
            self.enable_compression,
            custom_http_headers,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            application_name = header.application_name(),
            network_code = header.network_code().unwrap_or(""),
            proxied = transport.is_proxied(),
            compression = header.compression_enabled(),
            "built DFP client"
        );

        Ok(DfpClient::from_parts(
            transport,
            Arc::new(header),
            self.cache,
            self.https_proxy,
        ))
    }
}
