//! SOAP client for the DoubleClick for Publishers / Ad Manager API.
//!
//! This crate binds to a service description at runtime and invokes its
//! operations over HTTPS, with per-call authentication and identification
//! headers. It also provides a data downloader that runs report jobs to
//! completion and pages PQL queries into memory or CSV.
//!
//! ## Features
//!
//! - Service proxies for any catalogued version and service
//! - Static access tokens and OAuth 2.0 refresh tokens
//! - HTTPS proxy tunnelling and gzip response compression
//! - Service-description caching
//! - YAML configuration (`googleads.yaml`)
//!
//! ## Example
//!
//! ```ignore
//! use dfp_soap_client::{DfpClient, Element};
//!
//! let client = DfpClient::load_from_storage(None)?;
//!
//! // Weakly typed call
//! let network_service = client.get_service("NetworkService", None, None).await?;
//! let network = network_service.call("getCurrentNetwork", vec![]).await?;
//! println!("{:?}", network.and_then(|n| n.child_text("displayName").map(str::to_owned)));
//! ```
//!
//! ## PQL Example
//!
//! ```ignore
//! use dfp_soap_client::{BindVariable, DfpClient};
//!
//! let client = DfpClient::load_from_storage(None)?;
//! let downloader = client.get_data_downloader(None, None);
//!
//! let rows = downloader
//!     .download_pql_result_to_list(
//!         "SELECT Id, Name FROM Line_Item WHERE Status = :status",
//!         &[BindVariable::new("status", "READY")],
//!     )
//!     .await?;
//!
//! // First row is the header
//! for row in rows {
//!     println!("{:?}", row);
//! }
//! ```
//!
//! ## Report Example
//!
//! ```ignore
//! use dfp_soap_client::{DfpClient, Element};
//!
//! let downloader = client.get_data_downloader(None, None);
//! let report_job = Element::new("reportJob").with_child(
//!     Element::new("reportQuery")
//!         .with_child(Element::text_element("dimensions", "DATE"))
//!         .with_child(Element::text_element("columns", "AD_SERVER_IMPRESSIONS"))
//!         .with_child(Element::text_element("dateRangeType", "YESTERDAY")),
//! );
//!
//! // Polls every 30 seconds; bound it with a timeout if needed
//! let report_job_id = tokio::time::timeout(
//!     Duration::from_secs(3600),
//!     downloader.wait_for_report(report_job),
//! )
//! .await??;
//!
//! let mut file = tokio::fs::File::create("report.csv.gz").await?;
//! downloader
//!     .download_report_to_file(report_job_id, "CSV_DUMP", &mut file)
//!     .await?;
//! ```

mod builder;
mod cache;
pub mod catalog;
mod client;
mod config;
mod credentials;
mod downloader;
mod error;
mod header;
mod service;
pub mod transport;
mod wsdl;

pub use builder::DfpClientBuilder;
pub use cache::{DescriptionCache, InMemoryCache};
pub use client::{DEFAULT_SERVER, DfpClient};
pub use config::{CONFIG_SECTION, ClientConfig, DEFAULT_CONFIG_FILE, LEGACY_CONFIG_SECTION};
pub use credentials::{
    AccessTokenCredentials, CredentialsProvider, GOOGLE_OAUTH2_ENDPOINT, REFRESH_MARGIN,
    RefreshTokenCredentials,
};
pub use downloader::{
    CHUNK_SIZE, DEFAULT_POLL_INTERVAL, DataDownloader, PqlRecord, PqlSelect, ReportJobs,
    collect_pql_rows, copy_body, pql_records, wait_for_report, write_pql_csv,
};
pub use error::ClientError;
pub use header::{
    APPLICATION_NAME_PLACEHOLDER, GZIP_SUFFIX, HeaderHandler, LIBRARY_SIGNATURE, OutgoingCall,
    validate_application_name,
};
pub use service::{
    MAX_MESSAGE_CHARS, PublisherQueryLanguageService, ReportDownloadOptions, ReportJobStatus,
    ReportService, ServiceProxy,
};
pub use wsdl::ServiceDescription;

// Re-export the protocol types callers build requests from.
pub use dfp_soap_core::{
    ApiError, BindVariable, Cell, ColumnType, Date, DateTime, EMPTY_CELL, Element, FilterStatement,
    ResultSet, Row, SUGGESTED_PAGE_LIMIT, Statement, StatementBuilder, Value, ValueKind,
};
