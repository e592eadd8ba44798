//! TLS connector setup for the hyper HTTP client.
//!
//! # Feature Flags
//!
//! TLS support requires both a crypto provider and root certificates:
//!
//! - **Crypto providers** (choose one):
//!   - `tls-ring` - Use ring crypto (default with `tls` feature)
//!   - `tls-aws-lc` - Use AWS LC crypto
//!
//! - **Root certificates** (choose one):
//!   - `tls-native-roots` - Use system root certificates (default with `tls` feature)
//!   - `tls-webpki-roots` - Use bundled Mozilla root certificates
//!
//! Without a feature-gated provider, a provider installed with
//! `CryptoProvider::install_default()` is used.

use std::sync::Arc;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use rustls::ClientConfig;

use super::proxy::ProxyConnector;
use crate::error::ClientError;

/// Check if TLS features are properly configured.
///
/// Returns true if both a crypto provider AND root certificates are available.
#[inline]
pub const fn has_tls_support() -> bool {
    cfg!(any(feature = "tls-ring", feature = "tls-aws-lc"))
        && cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))
}

fn crypto_provider() -> Result<Arc<rustls::crypto::CryptoProvider>, ClientError> {
    #[cfg(feature = "tls-ring")]
    return Ok(Arc::new(rustls::crypto::ring::default_provider()));

    #[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
    return Ok(Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

    #[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .ok_or_else(|| {
            ClientError::config(
                "HTTPS requires a crypto provider: enable `tls-ring` or `tls-aws-lc`, \
                 or install one with `CryptoProvider::install_default()`",
            )
        })
}

/// Build the default TLS configuration from the enabled features.
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    let builder = ClientConfig::builder_with_provider(crypto_provider()?)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::config(format!("TLS setup failed: {e}")))?;
    Ok(builder
        .with_root_certificates(build_root_store()?)
        .with_no_client_auth())
}

/// Build the root certificate store from enabled features.
fn build_root_store() -> Result<rustls::RootCertStore, ClientError> {
    #[allow(unused_mut)]
    let mut roots = rustls::RootCertStore::empty();

    // Prefer native over webpki if both are enabled.
    #[cfg(feature = "tls-native-roots")]
    {
        let native_certs = rustls_native_certs::load_native_certs();
        if !native_certs.errors.is_empty() {
            // Some certs may still have loaded.
            #[cfg(feature = "tracing")]
            tracing::debug!("errors loading native certs: {:?}", native_certs.errors);
        }
        roots.add_parsable_certificates(native_certs.certs);
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    if !cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots")) {
        return Err(ClientError::config(
            "HTTPS requires TLS root certificates: enable `tls-native-roots` or `tls-webpki-roots`",
        ));
    }
    Ok(roots)
}

/// Wrap `connector` with TLS for `https://` destinations.
///
/// Plain `http://` destinations pass through untouched.
pub fn build_https_connector(
    tls_config: ClientConfig,
    connector: ProxyConnector,
) -> HttpsConnector<ProxyConnector> {
    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_all_versions()
        .wrap_connector(connector)
}
