//! HTTP transport layer.
//!
//! This module provides the [`HyperTransport`] type, which handles HTTP communication
//! using hyper_util's legacy client. It supports:
//!
//! - HTTP/1.1 and HTTP/2 with automatic protocol negotiation
//! - TLS with rustls (feature-gated)
//! - Tunnelling through an HTTPS proxy
//! - Connection pooling
//!
//! # Feature Flags
//!
//! TLS support requires enabling the appropriate features:
//!
//! - `tls` (default) - Enables `tls-ring` + `tls-native-roots` for convenience
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates

mod connector;
mod hyper;
mod proxy;

pub use connector::{build_https_connector, default_tls_config, has_tls_support};
pub use hyper::{DEFAULT_TIMEOUT, HyperTransport, HyperTransportBuilder, RequestBody};
pub use proxy::ProxyConnector;

// Re-export rustls types that users might need for TLS configuration
pub use rustls::ClientConfig as TlsClientConfig;
