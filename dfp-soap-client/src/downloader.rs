//! Data downloader.
//!
//! [`DataDownloader`] runs report jobs to completion and streams their
//! artifacts, and pages PQL queries into memory or CSV. It is created by
//! [`DfpClient::get_data_downloader`] and creates its service proxies on
//! first use.

mod pql;
mod report;

use std::time::Duration;

use bytes::Bytes;
use dfp_soap_core::{BindVariable, Cell, Element};
use http::Request;
use tokio::io::AsyncWrite;
use tokio::sync::OnceCell;

pub use pql::{PqlRecord, PqlSelect, collect_pql_rows, pql_records, write_pql_csv};
pub use report::{CHUNK_SIZE, DEFAULT_POLL_INTERVAL, ReportJobs, copy_body, wait_for_report};

use crate::client::DfpClient;
use crate::error::ClientError;
use crate::service::{
    MAX_MESSAGE_CHARS, PublisherQueryLanguageService, ReportDownloadOptions, ReportService, truncate,
};
use crate::transport::RequestBody;

/// Report and PQL downloads for one API version and server.
#[derive(Debug)]
pub struct DataDownloader {
    client: DfpClient,
    version: String,
    server: String,
    poll_interval: Duration,
    report_service: OnceCell<ReportService>,
    pql_service: OnceCell<PublisherQueryLanguageService>,
}

impl DataDownloader {
    pub(crate) fn new(client: DfpClient, version: &str, server: &str) -> Self {
        Self {
            client,
            version: version.to_string(),
            server: server.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            report_service: OnceCell::new(),
            pql_service: OnceCell::new(),
        }
    }

    /// Poll report jobs every `interval` instead of every 30 seconds.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// The `ReportService` proxy, created on first use.
    pub async fn report_service(&self) -> Result<&ReportService, ClientError> {
        self.report_service
            .get_or_try_init(|| async {
                let proxy = self
                    .client
                    .get_service("ReportService", Some(self.version.as_str()), Some(self.server.as_str()))
                    .await?;
                Ok(ReportService::new(proxy))
            })
            .await
    }

    /// The `PublisherQueryLanguageService` proxy, created on first use.
    pub async fn pql_service(&self) -> Result<&PublisherQueryLanguageService, ClientError> {
        self.pql_service
            .get_or_try_init(|| async {
                let proxy = self
                    .client
                    .get_service(
                        "PublisherQueryLanguageService",
                        Some(self.version.as_str()),
                        Some(self.server.as_str()),
                    )
                    .await?;
                Ok(PublisherQueryLanguageService::new(proxy))
            })
            .await
    }

    /// Run `report_job` and wait until it completes; returns its id.
    ///
    /// Fails with [`ClientError::ReportFailed`] if the job fails. Wrap the
    /// call in `tokio::time::timeout` to bound the wait.
    pub async fn wait_for_report(&self, report_job: Element) -> Result<i64, ClientError> {
        wait_for_report(self.report_service().await?, report_job, self.poll_interval).await
    }

    /// Download a finished report in `export_format` with default options.
    pub async fn download_report_to_file<W>(
        &self,
        report_job_id: i64,
        export_format: &str,
        sink: &mut W,
    ) -> Result<u64, ClientError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.download_report_to_file_with_options(
            report_job_id,
            &ReportDownloadOptions::new(export_format),
            sink,
        )
        .await
    }

    /// Download a finished report into `sink`; returns the byte count.
    ///
    /// The artifact is written as served, in writes of at most
    /// [`CHUNK_SIZE`] bytes, and `sink` is flushed at the end.
    pub async fn download_report_to_file_with_options<W>(
        &self,
        report_job_id: i64,
        options: &ReportDownloadOptions,
        sink: &mut W,
    ) -> Result<u64, ClientError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = self
            .report_service()
            .await?
            .report_download_url(report_job_id, options)
            .await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(report_job_id, export_format = %options.export_format, "downloading report");

        // The URL is pre-signed; only custom headers go along.
        let mut request = Request::get(url.as_str())
            .body(RequestBody::new(Bytes::new()))
            .map_err(|e| ClientError::transport(format!("invalid report download URL: {e}")))?;
        request
            .headers_mut()
            .extend(self.client.header().custom_http_headers().clone());

        let response = self.client.transport().open(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = http_body_util::BodyExt::collect(response.into_body())
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: truncate(&String::from_utf8_lossy(&body), MAX_MESSAGE_CHARS).to_string(),
            });
        }

        copy_body(response.into_body(), sink).await
    }

    /// Page through `query` and return the header and every row.
    pub async fn download_pql_result_to_list(
        &self,
        query: &str,
        values: &[BindVariable],
    ) -> Result<Vec<Vec<Cell>>, ClientError> {
        collect_pql_rows(self.pql_service().await?, query, values).await
    }

    /// Page through `query` and write it to `sink` as CSV, header first.
    ///
    /// Returns the number of data rows written.
    pub async fn download_pql_result_to_csv<W: std::io::Write>(
        &self,
        query: &str,
        sink: W,
        values: &[BindVariable],
    ) -> Result<u64, ClientError> {
        write_pql_csv(self.pql_service().await?, query, sink, values).await
    }
}
