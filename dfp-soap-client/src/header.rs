//! Per-call header injection.
//!
//! [`HeaderHandler`] fills in both header layers of an outgoing call: the
//! SOAP `RequestHeader` and the HTTP headers. It is shared by every proxy
//! created from one client.

use std::fmt;
use std::sync::Arc;

use dfp_soap_core::RequestHeader;
use http::HeaderMap;
use http::header::{ACCEPT_ENCODING, HeaderValue};

use crate::credentials::CredentialsProvider;
use crate::error::ClientError;

/// Identifies this library in the `applicationName` of every request.
pub const LIBRARY_SIGNATURE: &str = concat!(
    " (DfpApi-Rust, dfp-soap-client/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Appended to the library signature when response compression is on.
pub const GZIP_SUFFIX: &str = " (gzip)";

/// Placeholder shipped in sample configuration files.
pub const APPLICATION_NAME_PLACEHOLDER: &str = "INSERT_APPLICATION_NAME_HERE";

/// Reject empty application names and the sample placeholder.
pub fn validate_application_name(application_name: &str) -> Result<(), ClientError> {
    let trimmed = application_name.trim();
    if trimmed.is_empty() || trimmed.contains(APPLICATION_NAME_PLACEHOLDER) {
        return Err(ClientError::MisconfiguredApplicationName);
    }
    Ok(())
}

/// Headers of one outgoing call, filled in by [`HeaderHandler::prepare`].
#[derive(Debug, Clone, Default)]
pub struct OutgoingCall {
    pub soap_header: RequestHeader,
    pub http_headers: HeaderMap,
}

/// Builds the headers attached to every outgoing call.
#[derive(Clone)]
pub struct HeaderHandler {
    credentials: Arc<dyn CredentialsProvider>,
    application_name: String,
    network_code: Option<String>,
    enable_compression: bool,
    custom_http_headers: HeaderMap,
}

impl fmt::Debug for HeaderHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderHandler")
            .field("application_name", &self.application_name)
            .field("network_code", &self.network_code)
            .field("enable_compression", &self.enable_compression)
            .field("custom_http_headers", &self.custom_http_headers.len())
            .finish_non_exhaustive()
    }
}

impl HeaderHandler {
    pub fn new(
        credentials: Arc<dyn CredentialsProvider>,
        application_name: String,
        network_code: Option<String>,
        enable_compression: bool,
        custom_http_headers: HeaderMap,
    ) -> Self {
        Self {
            credentials,
            application_name,
            network_code,
            enable_compression,
            custom_http_headers,
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn network_code(&self) -> Option<&str> {
        self.network_code.as_deref()
    }

    pub fn compression_enabled(&self) -> bool {
        self.enable_compression
    }

    pub fn custom_http_headers(&self) -> &HeaderMap {
        &self.custom_http_headers
    }

    /// The `applicationName` sent on the wire.
    pub fn signed_application_name(&self) -> String {
        let mut name = format!("{}{}", self.application_name, LIBRARY_SIGNATURE);
        if self.enable_compression {
            name.push_str(GZIP_SUFFIX);
        }
        name
    }

    /// Headers that do not depend on credentials: custom headers and, with
    /// compression on, `Accept-Encoding: gzip`.
    pub fn static_http_headers(&self) -> HeaderMap {
        let mut headers = self.custom_http_headers.clone();
        if self.enable_compression {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }
        headers
    }

    /// Fill in the SOAP and HTTP headers of `call`.
    ///
    /// Credentials are fetched fresh on every call. Headers already on the
    /// call are overwritten by name.
    pub async fn prepare(&self, call: &mut OutgoingCall) -> Result<(), ClientError> {
        call.soap_header = RequestHeader {
            network_code: self.network_code.clone(),
            application_name: self.signed_application_name(),
        };

        let credential_headers = self.credentials.http_headers().await?;
        for headers in [credential_headers, self.static_http_headers()] {
            let mut last_name = None;
            for (name, value) in headers {
                // `HeaderMap::into_iter` yields `None` for repeated values of the previous name.
                match name {
                    Some(name) => {
                        call.http_headers.insert(name.clone(), value);
                        last_name = Some(name);
                    }
                    None => {
                        if let Some(name) = &last_name {
                            call.http_headers.append(name.clone(), value);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
