//! Client error types.
//!
//! This module provides [`ClientError`], the error type for every client
//! operation.

use std::time::Duration;

use dfp_soap_core::{ApiError, ResultSetError, StatementError, ValueError, XmlError};

/// Error variants surfaced by the client.
///
/// Nothing is retried internally: transport failures, faults and failed
/// report jobs all reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The application name is empty or still the placeholder.
    #[error(
        "application_name must be set to a value identifying your application, \
         not left empty or as the default placeholder"
    )]
    MisconfiguredApplicationName,

    /// The requested API version is not in the catalog.
    #[error("unknown API version {version:?}; known versions: {}", known.join(", "))]
    UnknownVersion { version: String, known: Vec<String> },

    /// The service does not exist in an otherwise known version.
    #[error(
        "unknown service {service:?} for version {version}; known services: {}",
        known.join(", ")
    )]
    UnknownService {
        service: String,
        version: String,
        known: Vec<String>,
    },

    /// The service description could not be fetched although the catalog
    /// knows the version and service. `source` is the underlying failure.
    #[error("failed to fetch service description from {url}: {source}")]
    DescriptionFetchFailed {
        url: String,
        #[source]
        source: Box<ClientError>,
    },

    /// The operation is not advertised by the service description.
    #[error("service {service} has no operation {operation:?}")]
    UnknownOperation { service: String, operation: String },

    /// Transport-level error (connection failed, TLS, proxy, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// A request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A non-success HTTP status without a SOAP fault body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A SOAP fault returned by the server.
    #[error("{message}")]
    Fault { message: String, errors: Vec<ApiError> },

    /// The report job ended in the FAILED state.
    #[error("report job failed. The ID of the failed report is: {report_job_id}")]
    ReportFailed { report_job_id: i64 },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Statement(#[from] StatementError),

    /// Response decoding error.
    #[error("decode error: {0}")]
    Decode(String),

    /// Request encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The credentials provider could not produce headers.
    #[error("credentials error: {0}")]
    Credentials(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(String),
}

impl ClientError {
    /// Create a transport error from anything displayable.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        ClientError::Transport(err.to_string())
    }

    /// Create a decode error from anything displayable.
    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        ClientError::Decode(err.to_string())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        ClientError::Config(message.into())
    }

    /// API errors carried by a fault (empty for other variants).
    pub fn api_errors(&self) -> &[ApiError] {
        match self {
            ClientError::Fault { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Returns true for errors that originate below the SOAP layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Timeout(_) | ClientError::Http { .. }
        )
    }
}

impl From<XmlError> for ClientError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Write(message) => ClientError::Encode(message),
            other => ClientError::Decode(other.to_string()),
        }
    }
}

impl From<ResultSetError> for ClientError {
    fn from(err: ResultSetError) -> Self {
        match err {
            ResultSetError::Xml(xml) => xml.into(),
            ResultSetError::Value(value) => value.into(),
        }
    }
}

impl From<csv::Error> for ClientError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => ClientError::Io(io),
                other => ClientError::Csv(format!("{other:?}")),
            }
        } else {
            ClientError::Csv(err.to_string())
        }
    }
}
