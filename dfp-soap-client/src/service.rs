//! Service proxies.
//!
//! A [`ServiceProxy`] is bound to one fetched service description and
//! invokes its operations by name with element-tree arguments. The typed
//! wrappers [`ReportService`] and [`PublisherQueryLanguageService`] cover the
//! operations the data downloader relies on.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use dfp_soap_core::{Element, ResponseBody, ResultSet, Statement, decode_response, encode_request};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request};

use crate::catalog;
use crate::error::ClientError;
use crate::header::{HeaderHandler, OutgoingCall};
use crate::transport::{HyperTransport, RequestBody};
use crate::wsdl::ServiceDescription;

/// Longest fault message or error body reproduced in logs and errors.
pub const MAX_MESSAGE_CHARS: usize = 16_000;

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// A weakly typed client for one remote service.
///
/// Cloning is cheap; clones share the transport, the header handler and the
/// parsed description.
#[derive(Clone, Debug)]
pub struct ServiceProxy {
    transport: HyperTransport,
    header: Arc<HeaderHandler>,
    description: Arc<ServiceDescription>,
    service_name: String,
    version: String,
}

impl ServiceProxy {
    pub(crate) fn new(
        transport: HyperTransport,
        header: Arc<HeaderHandler>,
        description: Arc<ServiceDescription>,
        service_name: String,
        version: String,
    ) -> Self {
        Self {
            transport,
            header,
            description,
            service_name,
            version,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &ServiceDescription {
        &self.description
    }

    /// Operations advertised by the service description.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.description.operations.iter().map(String::as_str)
    }

    /// Invoke `operation` and return its first `rval`, if any.
    pub async fn call(&self, operation: &str, args: Vec<Element>) -> Result<Option<Element>, ClientError> {
        Ok(self.call_all(operation, args).await?.into_iter().next())
    }

    /// Invoke `operation` and return every `rval` in order.
    ///
    /// Arguments are the children of the operation element, named as the
    /// service expects (`reportJobId`, `filterStatement`, ...).
    pub async fn call_all(&self, operation: &str, args: Vec<Element>) -> Result<Vec<Element>, ClientError> {
        if !self.description.has_operation(operation) {
            return Err(ClientError::UnknownOperation {
                service: self.service_name.clone(),
                operation: operation.to_string(),
            });
        }

        let mut outgoing = OutgoingCall::default();
        self.header.prepare(&mut outgoing).await?;
        let body = encode_request(
            &self.description.namespace,
            &outgoing.soap_header,
            operation,
            &args,
        )?;

        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                service = %self.service_name,
                method = operation,
                network_code = outgoing.soap_header.network_code.as_deref().unwrap_or(""),
                "outgoing SOAP request"
            );
            tracing::trace!(body = %String::from_utf8_lossy(&body), "outgoing SOAP envelope");
        }

        let mut request = Request::post(self.description.endpoint.as_str())
            .body(RequestBody::new(Bytes::from(body)))
            .map_err(|e| ClientError::transport(format!("invalid endpoint {}: {e}", self.description.endpoint)))?;
        let headers = request.headers_mut();
        headers.extend(outgoing.http_headers);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(SOAP_CONTENT_TYPE));
        headers.insert("soapaction", HeaderValue::from_static("\"\""));

        let response = self.transport.send(request).await?;
        let status = response.status();
        let text = String::from_utf8_lossy(response.body());

        #[cfg(feature = "tracing")]
        tracing::trace!(status = status.as_u16(), body = %text, "incoming SOAP envelope");

        // Faults arrive with HTTP 500, so the body is decoded before the status is judged.
        let decoded = match decode_response(&text) {
            Ok(decoded) => decoded,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Http {
                    status: status.as_u16(),
                    message: truncate(&text, MAX_MESSAGE_CHARS).to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        #[cfg(feature = "tracing")]
        {
            let fault_message = match &decoded.body {
                ResponseBody::Fault(fault) => truncate(&fault.message, MAX_MESSAGE_CHARS),
                ResponseBody::Success(_) => "",
            };
            tracing::info!(
                service = %self.service_name,
                method = operation,
                request_id = decoded.header.request_id.as_deref().unwrap_or(""),
                response_time = decoded.header.response_time.as_deref().unwrap_or(""),
                is_fault = decoded.is_fault(),
                fault_message,
                "incoming SOAP response"
            );
        }

        match decoded.body {
            ResponseBody::Success(rvals) => Ok(rvals),
            ResponseBody::Fault(fault) => Err(ClientError::Fault {
                message: truncate(&fault.message, MAX_MESSAGE_CHARS).to_string(),
                errors: fault.errors,
            }),
        }
    }
}

/// Cut `text` to at most `max_chars` characters.
pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Status of a report job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportJobStatus {
    InProgress,
    Completed,
    Failed,
}

impl ReportJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportJobStatus::InProgress => "IN_PROGRESS",
            ReportJobStatus::Completed => "COMPLETED",
            ReportJobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ReportJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportJobStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IN_PROGRESS" => Ok(ReportJobStatus::InProgress),
            "COMPLETED" => Ok(ReportJobStatus::Completed),
            "FAILED" => Ok(ReportJobStatus::Failed),
            other => Err(ClientError::Decode(format!("unknown report job status {other:?}"))),
        }
    }
}

/// Options for `getReportDownloadUrlWithOptions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDownloadOptions {
    /// `CSV_DUMP`, `TSV`, `XML`, `XLSX`, ...
    pub export_format: String,
    pub include_report_properties: bool,
    pub include_totals_row: bool,
    pub use_gzip_compression: bool,
}

impl ReportDownloadOptions {
    /// Defaults for `export_format`: no report properties, gzip on, and a
    /// totals row for every format except `CSV_DUMP`.
    pub fn new<S: Into<String>>(export_format: S) -> Self {
        let export_format = export_format.into();
        Self {
            include_totals_row: export_format != "CSV_DUMP",
            export_format,
            include_report_properties: false,
            use_gzip_compression: true,
        }
    }

    fn to_element(&self) -> Element {
        Element::new("reportDownloadOptions")
            .with_child(Element::text_element("exportFormat", self.export_format.as_str()))
            .with_child(Element::text_element(
                "includeReportProperties",
                self.include_report_properties.to_string(),
            ))
            .with_child(Element::text_element(
                "includeTotalsRow",
                self.include_totals_row.to_string(),
            ))
            .with_child(Element::text_element(
                "useGzipCompression",
                self.use_gzip_compression.to_string(),
            ))
    }
}

/// Typed access to `ReportService`.
#[derive(Clone, Debug)]
pub struct ReportService {
    proxy: ServiceProxy,
}

impl ReportService {
    pub fn new(proxy: ServiceProxy) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &ServiceProxy {
        &self.proxy
    }

    /// Submit a report job and return its id.
    ///
    /// `report_job` holds the `ReportJob` fields (`reportQuery`, ...); it is
    /// sent as the `reportJob` argument whatever its own name.
    pub async fn run_report_job(&self, report_job: Element) -> Result<i64, ClientError> {
        let report_job = if report_job.name() == "reportJob" {
            report_job
        } else {
            Element::new("reportJob").with_children(report_job.into_children())
        };
        let rval = self
            .proxy
            .call("runReportJob", vec![report_job])
            .await?
            .ok_or_else(|| ClientError::decode("runReportJob returned no report job"))?;
        parse_id(rval.require_text("id")?)
    }

    /// Current status of a report job.
    ///
    /// Versions with a status endpoint use `getReportJobStatus`; older ones
    /// read `reportJobStatus` from `getReportJob`.
    pub async fn report_job_status(&self, report_job_id: i64) -> Result<ReportJobStatus, ClientError> {
        let args = vec![Element::text_element("reportJobId", report_job_id.to_string())];
        if catalog::capabilities(self.proxy.version()).report_status_endpoint {
            let rval = self
                .proxy
                .call("getReportJobStatus", args)
                .await?
                .ok_or_else(|| ClientError::decode("getReportJobStatus returned no status"))?;
            rval.text().unwrap_or_default().parse()
        } else {
            let rval = self
                .proxy
                .call("getReportJob", args)
                .await?
                .ok_or_else(|| ClientError::decode("getReportJob returned no report job"))?;
            rval.require_text("reportJobStatus")?.parse()
        }
    }

    /// A temporary URL the finished report can be downloaded from.
    pub async fn report_download_url(
        &self,
        report_job_id: i64,
        options: &ReportDownloadOptions,
    ) -> Result<String, ClientError> {
        let args = vec![
            Element::text_element("reportJobId", report_job_id.to_string()),
            options.to_element(),
        ];
        let rval = self
            .proxy
            .call("getReportDownloadUrlWithOptions", args)
            .await?
            .ok_or_else(|| ClientError::decode("getReportDownloadUrlWithOptions returned no URL"))?;
        Ok(rval.text().unwrap_or_default().trim().to_string())
    }
}

/// Typed access to `PublisherQueryLanguageService`.
#[derive(Clone, Debug)]
pub struct PublisherQueryLanguageService {
    proxy: ServiceProxy,
}

impl PublisherQueryLanguageService {
    pub fn new(proxy: ServiceProxy) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &ServiceProxy {
        &self.proxy
    }

    /// Run one PQL page. A response without `rval` is an empty result set.
    pub async fn select(&self, statement: &Statement) -> Result<ResultSet, ClientError> {
        let rval = self
            .proxy
            .call("select", vec![statement.to_element("selectStatement")])
            .await?;
        match rval {
            Some(rval) => Ok(ResultSet::from_element(&rval)?),
            None => Ok(ResultSet::default()),
        }
    }
}

fn parse_id(text: &str) -> Result<i64, ClientError> {
    text.trim()
        .parse()
        .map_err(|_| ClientError::Decode(format!("invalid report job id {text:?}")))
}
