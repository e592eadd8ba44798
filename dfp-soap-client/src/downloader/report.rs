//! Report job polling and artifact download.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dfp_soap_core::Element;
use http_body_util::BodyExt;
use hyper::body::Body;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ClientError;
use crate::service::{ReportJobStatus, ReportService};

/// Largest single write to a download sink.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Poll cadence used unless the downloader is configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// The report operations the polling loop needs.
#[async_trait]
pub trait ReportJobs: Send + Sync {
    async fn run_report_job(&self, report_job: Element) -> Result<i64, ClientError>;

    async fn report_job_status(&self, report_job_id: i64) -> Result<ReportJobStatus, ClientError>;
}

#[async_trait]
impl ReportJobs for ReportService {
    async fn run_report_job(&self, report_job: Element) -> Result<i64, ClientError> {
        ReportService::run_report_job(self, report_job).await
    }

    async fn report_job_status(&self, report_job_id: i64) -> Result<ReportJobStatus, ClientError> {
        ReportService::report_job_status(self, report_job_id).await
    }
}

/// Submit `report_job` and poll every `poll_interval` until it finishes.
///
/// Returns the job id once `COMPLETED` is observed. `FAILED` ends polling
/// with [`ClientError::ReportFailed`]; any error while polling is returned
/// as is. There is no overall deadline.
pub async fn wait_for_report<R: ReportJobs + ?Sized>(
    jobs: &R,
    report_job: Element,
    poll_interval: Duration,
) -> Result<i64, ClientError> {
    let report_job_id = jobs.run_report_job(report_job).await?;

    #[cfg(feature = "tracing")]
    tracing::debug!(report_job_id, "report job submitted");

    loop {
        let status = jobs.report_job_status(report_job_id).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(report_job_id, status = %status, "report job status");

        match status {
            ReportJobStatus::Completed => return Ok(report_job_id),
            ReportJobStatus::Failed => return Err(ClientError::ReportFailed { report_job_id }),
            ReportJobStatus::InProgress => tokio::time::sleep(poll_interval).await,
        }
    }
}

/// Copy `body` into `sink`, at most [`CHUNK_SIZE`] bytes per write, then
/// flush. Returns the number of bytes written.
///
/// On error the sink keeps whatever was written before it.
pub async fn copy_body<B, W>(mut body: B, sink: &mut W) -> Result<u64, ClientError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0u64;
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| ClientError::transport(format!("reading report body failed: {e}")))?;
        let Ok(data) = frame.into_data() else {
            continue;
        };
        for chunk in data.chunks(CHUNK_SIZE) {
            sink.write_all(chunk).await?;
            written += chunk.len() as u64;
        }
    }
    sink.flush().await?;
    Ok(written)
}
