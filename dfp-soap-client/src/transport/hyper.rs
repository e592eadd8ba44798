//! Hyper-based HTTP transport.
//!
//! This module provides [`HyperTransport`], the HTTP transport used for
//! service descriptions, SOAP calls, OAuth token refreshes and report
//! downloads.

use std::time::Duration;

use bytes::Bytes;
use dfp_soap_core::CompressionEncoding;
use http::header::CONTENT_ENCODING;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;

use super::connector::{build_https_connector, default_tls_config};
use super::proxy::ProxyConnector;
use crate::error::ClientError;

/// Request body type accepted by the transport.
pub type RequestBody = Full<Bytes>;

/// Type alias for the hyper client with HTTPS connector.
type HyperClient = Client<HttpsConnector<ProxyConnector>, RequestBody>;

/// Timeout applied to every request unless configured otherwise.
///
/// Service descriptions can be several megabytes and slow to generate.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// HTTP transport using hyper_util's legacy client.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    timeout: Duration,
    proxied: bool,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("timeout", &self.timeout)
            .field("proxied", &self.proxied)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether connections are tunnelled through a proxy.
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    /// Send a request and return as soon as the response head arrives.
    ///
    /// The timeout covers connecting and waiting for the head only; the
    /// caller streams the body at its own pace.
    pub async fn open(&self, request: Request<RequestBody>) -> Result<Response<Incoming>, ClientError> {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(result) => result.map_err(|e| ClientError::Transport(format!("request failed: {}", e))),
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }

    /// Send a request and collect the whole response body.
    ///
    /// A gzip `Content-Encoding` is removed. The timeout covers the complete
    /// exchange.
    pub async fn send(&self, request: Request<RequestBody>) -> Result<Response<Bytes>, ClientError> {
        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ClientError::Transport(format!("request failed: {}", e)))?;
            let (mut parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| ClientError::Transport(format!("reading response body failed: {}", e)))?
                .to_bytes();

            let encoding = parts
                .headers
                .get(CONTENT_ENCODING)
                .map(|v| v.to_str().unwrap_or("unsupported"));
            let encoding = CompressionEncoding::from_header(encoding).ok_or_else(|| {
                ClientError::Decode(format!("unsupported content-encoding {:?}", encoding))
            })?;
            let body = if encoding.is_identity() {
                body
            } else {
                parts.headers.remove(CONTENT_ENCODING);
                encoding
                    .decompress(body)
                    .map_err(|e| ClientError::Decode(format!("{} decompression failed: {}", encoding.as_str(), e)))?
            };
            Ok(Response::from_parts(parts, body))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }
}

/// Builder for [`HyperTransport`].
///
/// # Example
///
/// ```ignore
/// use dfp_soap_client::transport::HyperTransportBuilder;
/// use std::time::Duration;
///
/// let transport = HyperTransportBuilder::new()
///     .https_proxy("http://proxy.internal:3128")
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// ```
pub struct HyperTransportBuilder {
    /// Custom TLS configuration.
    tls_config: Option<ClientConfig>,
    /// Proxy to tunnel through.
    https_proxy: Option<String>,
    /// Per-request timeout.
    timeout: Duration,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    /// Create a new transport builder with default settings.
    pub fn new() -> Self {
        Self {
            tls_config: None,
            https_proxy: None,
            timeout: DEFAULT_TIMEOUT,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }

    /// Set a custom TLS configuration.
    ///
    /// Use this to configure custom root certificates or client
    /// certificates.
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Tunnel all connections through this proxy.
    pub fn https_proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.https_proxy = Some(proxy.into());
        self
    }

    /// Set the per-request timeout.
    ///
    /// Default: one hour.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection pool idle timeout.
    ///
    /// Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, ClientError> {
        let tls_config = match self.tls_config {
            Some(config) => config,
            None => default_tls_config()?,
        };

        let connector = match &self.https_proxy {
            Some(proxy) => ProxyConnector::tunnel(proxy)?,
            None => ProxyConnector::direct(),
        };
        let proxied = connector.is_tunnel();
        let https_connector = build_https_connector(tls_config, connector);

        let mut builder = Client::builder(TokioExecutor::new());

        // Configure connection pool timer (required for pool_idle_timeout to work)
        builder.pool_timer(TokioTimer::new());

        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        Ok(HyperTransport {
            client: builder.build(https_connector),
            timeout: self.timeout,
            proxied,
        })
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("tls_config", &self.tls_config.is_some())
            .field("https_proxy", &self.https_proxy.is_some())
            .field("timeout", &self.timeout)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .finish()
    }
}
