//! The top-level client.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::Request;
use http_body_util::Full;

use crate::builder::DfpClientBuilder;
use crate::cache::DescriptionCache;
use crate::catalog;
use crate::config::ClientConfig;
use crate::credentials::CredentialsProvider;
use crate::downloader::DataDownloader;
use crate::error::ClientError;
use crate::header::HeaderHandler;
use crate::service::{MAX_MESSAGE_CHARS, ServiceProxy, truncate};
use crate::transport::HyperTransport;
use crate::wsdl::ServiceDescription;

/// Server used when none is given.
pub const DEFAULT_SERVER: &str = "https://ads.google.com";

/// Entry point: creates service proxies and data downloaders.
///
/// Cloning is cheap; clones share configuration, transport and cache.
#[derive(Clone)]
pub struct DfpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: HyperTransport,
    header: Arc<HeaderHandler>,
    cache: Option<Arc<dyn DescriptionCache>>,
    https_proxy: Option<String>,
}

impl std::fmt::Debug for DfpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DfpClient")
            .field("header", &self.inner.header)
            .field("transport", &self.inner.transport)
            .field("cache", &self.inner.cache.is_some())
            .finish()
    }
}

impl DfpClient {
    /// Start building a client.
    pub fn builder<C, S>(credentials: C, application_name: S) -> DfpClientBuilder
    where
        C: CredentialsProvider + 'static,
        S: Into<String>,
    {
        DfpClientBuilder::new(credentials, application_name)
    }

    pub(crate) fn from_parts(
        transport: HyperTransport,
        header: Arc<HeaderHandler>,
        cache: Option<Arc<dyn DescriptionCache>>,
        https_proxy: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                header,
                cache,
                https_proxy,
            }),
        }
    }

    /// Build a client from a YAML configuration file.
    ///
    /// `path` defaults to `googleads.yaml` in the home directory. When the
    /// file sets no `https_proxy`, the `HTTPS_PROXY` environment variable is
    /// used instead.
    pub fn load_from_storage(path: Option<&Path>) -> Result<Self, ClientError> {
        let mut config = ClientConfig::load(path)?;
        if config.https_proxy.is_none() {
            config.https_proxy = std::env::var("HTTPS_PROXY")
                .ok()
                .filter(|proxy| !proxy.trim().is_empty());
        }
        config.into_builder()?.build()
    }

    /// Build a client from YAML text.
    pub fn load_from_str(yaml: &str) -> Result<Self, ClientError> {
        ClientConfig::parse(yaml)?.into_builder()?.build()
    }

    pub fn application_name(&self) -> &str {
        self.inner.header.application_name()
    }

    pub fn network_code(&self) -> Option<&str> {
        self.inner.header.network_code()
    }

    pub fn https_proxy(&self) -> Option<&str> {
        self.inner.https_proxy.as_deref()
    }

    pub(crate) fn transport(&self) -> &HyperTransport {
        &self.inner.transport
    }

    pub(crate) fn header(&self) -> &HeaderHandler {
        &self.inner.header
    }

    /// Create a proxy for `service_name`.
    ///
    /// `version` defaults to the newest catalogued version and `server` to
    /// [`DEFAULT_SERVER`]. The service description is fetched from
    /// `<server>/apis/ads/publisher/<version>/<service_name>?wsdl`, or taken
    /// from the cache.
    ///
    /// # Errors
    ///
    /// If the description cannot be fetched or parsed, the catalog decides
    /// the error: `UnknownVersion` or `UnknownService` when it does not know
    /// the pair, otherwise `DescriptionFetchFailed` wrapping the failure.
    pub async fn get_service(
        &self,
        service_name: &str,
        version: Option<&str>,
        server: Option<&str>,
    ) -> Result<ServiceProxy, ClientError> {
        let version = version.unwrap_or_else(|| catalog::latest_version());
        let url = description_url(server.unwrap_or(DEFAULT_SERVER), version, service_name);

        let description = match self.fetch_description(&url).await {
            Ok(description) => description,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %url, error = %err, "service description unavailable");
                return Err(match catalog::diagnose(version, service_name) {
                    Some(diagnosis) => diagnosis,
                    None => ClientError::DescriptionFetchFailed {
                        url,
                        source: Box::new(err),
                    },
                });
            }
        };

        Ok(ServiceProxy::new(
            self.inner.transport.clone(),
            self.inner.header.clone(),
            Arc::new(description),
            service_name.to_string(),
            version.to_string(),
        ))
    }

    /// Create a data downloader bound to this client.
    pub fn get_data_downloader(&self, version: Option<&str>, server: Option<&str>) -> DataDownloader {
        DataDownloader::new(
            self.clone(),
            version.unwrap_or_else(|| catalog::latest_version()),
            server.unwrap_or(DEFAULT_SERVER),
        )
    }

    async fn fetch_description(&self, url: &str) -> Result<ServiceDescription, ClientError> {
        if let Some(cached) = self.inner.cache.as_ref().and_then(|cache| cache.get(url)) {
            if let Ok(description) = parse_description(&cached) {
                #[cfg(feature = "tracing")]
                tracing::trace!(url, "service description cache hit");
                return Ok(description);
            }
        }

        let mut request = Request::get(url)
            .body(Full::new(Bytes::new()))
            .map_err(|e| ClientError::transport(format!("invalid description URL {url}: {e}")))?;
        request
            .headers_mut()
            .extend(self.inner.header.static_http_headers());

        #[cfg(feature = "tracing")]
        tracing::debug!(url, "fetching service description");

        let response = self.inner.transport.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: truncate(&String::from_utf8_lossy(response.body()), MAX_MESSAGE_CHARS)
                    .to_string(),
            });
        }

        let document = response.into_body();
        let description = parse_description(&document)?;
        if let Some(cache) = &self.inner.cache {
            cache.put(url, document);
        }
        Ok(description)
    }
}

fn parse_description(document: &[u8]) -> Result<ServiceDescription, ClientError> {
    let text = std::str::from_utf8(document)
        .map_err(|e| ClientError::decode(format!("service description is not UTF-8: {e}")))?;
    Ok(ServiceDescription::parse(text)?)
}

/// `<server>/apis/ads/publisher/<version>/<service>?wsdl`, without a doubled slash.
pub(crate) fn description_url(server: &str, version: &str, service_name: &str) -> String {
    format!(
        "{}/apis/ads/publisher/{}/{}?wsdl",
        server.trim_end_matches('/'),
        version,
        service_name
    )
}
