//! In-process mock of the Ad Manager SOAP endpoints.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use dfp_soap_client::{AccessTokenCredentials, DfpClient, DfpClientBuilder, Element};
use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";
pub const APPLICATION_NAME: &str = "Integration Test";
pub const NETWORK_CODE: &str = "1234";
pub const REPORT_JOB_ID: i64 = 7;

const VERSIONS: &[&str] = &["v201502", "v202408"];

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    /// Name of the SOAP operation, for POSTs.
    pub fn operation(&self) -> Option<String> {
        let envelope = Element::parse(&self.body).ok()?;
        Some(envelope.child("Body")?.children().first()?.name().to_string())
    }
}

pub struct MockState {
    pub base: String,
    /// Rows the PQL table holds; pages are cut from it by LIMIT/OFFSET.
    pub pql_rows: usize,
    pub statuses: Mutex<VecDeque<&'static str>>,
    pub report_bytes: Vec<u8>,
    pub requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn soap_operations(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.method == Method::POST)
            .filter_map(Recorded::operation)
            .collect()
    }

    pub fn wsdl_fetches(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == Method::GET && r.path.starts_with("/apis/"))
            .count()
    }

    fn record(&self, method: Method, path: String, headers: &HeaderMap, body: &str) {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            headers: headers.clone(),
            body: body.to_string(),
        });
    }
}

/// Options for a mock server.
pub struct Mock {
    pub pql_rows: usize,
    pub statuses: Vec<&'static str>,
    pub report_bytes: Vec<u8>,
}

impl Default for Mock {
    fn default() -> Self {
        Self {
            pql_rows: 0,
            statuses: vec!["COMPLETED"],
            report_bytes: (0..40_000u32).map(|i| (i % 251) as u8).collect(),
        }
    }
}

impl Mock {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start(self) -> Arc<MockState> {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState {
            base: format!("http://{addr}"),
            pql_rows: self.pql_rows,
            statuses: Mutex::new(self.statuses.into()),
            report_bytes: self.report_bytes,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(
                "/apis/ads/publisher/{version}/{service}",
                get(description).post(soap),
            )
            .route("/download/{id}", get(download))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        state
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn builder() -> DfpClientBuilder {
    DfpClient::builder(AccessTokenCredentials::new(TOKEN).unwrap(), APPLICATION_NAME)
        .network_code(NETWORK_CODE)
}

pub fn client() -> DfpClient {
    builder().build().unwrap()
}

fn operations(service: &str) -> Option<&'static [&'static str]> {
    match service {
        "NetworkService" => Some(&["getCurrentNetwork", "makeTestNetwork"]),
        "ReportService" => Some(&[
            "runReportJob",
            "getReportJob",
            "getReportJobStatus",
            "getReportDownloadUrlWithOptions",
        ]),
        "PublisherQueryLanguageService" => Some(&["select"]),
        _ => None,
    }
}

fn namespace(version: &str) -> String {
    format!("https://www.google.com/apis/ads/publisher/{version}")
}

async fn description(
    State(state): State<Arc<MockState>>,
    Path((version, service)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    state.record(
        Method::GET,
        format!("/apis/ads/publisher/{version}/{service}"),
        &headers,
        "",
    );
    let Some(operations) = operations(&service).filter(|_| VERSIONS.contains(&version.as_str())) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let operations: String = operations
        .iter()
        .map(|op| format!(r#"<wsdl:operation name="{op}"/>"#))
        .collect();
    let wsdl = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:wsdlsoap="http://schemas.xmlsoap.org/wsdl/soap/"
    targetNamespace="{ns}">
  <wsdl:portType name="{service}Interface">{operations}</wsdl:portType>
  <wsdl:service name="{service}">
    <wsdl:port name="{service}InterfacePort" binding="{service}SoapBinding">
      <wsdlsoap:address location="{base}/apis/ads/publisher/{version}/{service}"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#,
        ns = namespace(&version),
        base = state.base,
    );
    xml_response(StatusCode::OK, wsdl, false)
}

async fn soap(
    State(state): State<Arc<MockState>>,
    Path((version, service)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.record(
        Method::POST,
        format!("/apis/ads/publisher/{version}/{service}"),
        &headers,
        &body,
    );
    let gzip = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"));

    let envelope = Element::parse(&body).unwrap();
    let call = envelope.child("Body").unwrap().children()[0].clone();
    let ns = namespace(&version);

    let rvals = match call.name() {
        "getCurrentNetwork" => vec![format!(
            "<rval><networkCode>{NETWORK_CODE}</networkCode><displayName>Mock &amp; Co</displayName></rval>"
        )],
        "makeTestNetwork" => return fault(&ns),
        "runReportJob" => vec![format!("<rval><id>{REPORT_JOB_ID}</id></rval>")],
        "getReportJobStatus" => vec![format!("<rval>{}</rval>", next_status(&state))],
        "getReportJob" => vec![format!(
            "<rval><id>{REPORT_JOB_ID}</id><reportJobStatus>{}</reportJobStatus></rval>",
            next_status(&state)
        )],
        "getReportDownloadUrlWithOptions" => {
            // Any id gets a URL; only REPORT_JOB_ID has an artifact behind it.
            let id = call.child_text("reportJobId").unwrap_or_default();
            vec![format!("<rval>{}/download/{id}</rval>", state.base)]
        }
        "select" => {
            let query = call
                .child("selectStatement")
                .and_then(|s| s.child_text("query"))
                .unwrap_or_default();
            vec![result_set(query, state.pql_rows)]
        }
        other => panic!("unexpected operation {other}"),
    };

    let response = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <ResponseHeader xmlns="{ns}"><requestId>req-1</requestId><responseTime>12</responseTime></ResponseHeader>
  </soap:Header>
  <soap:Body>
    <{op}Response xmlns="{ns}">{rvals}</{op}Response>
  </soap:Body>
</soap:Envelope>"#,
        op = call.name(),
        rvals = rvals.concat(),
    );
    xml_response(StatusCode::OK, response, gzip)
}

async fn download(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state.record(Method::GET, format!("/download/{id}"), &headers, "");
    if id != REPORT_JOB_ID {
        return (StatusCode::NOT_FOUND, "no such report").into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        state.report_bytes.clone(),
    )
        .into_response()
}

fn next_status(state: &MockState) -> &'static str {
    let mut statuses = state.statuses.lock().unwrap();
    if statuses.len() > 1 {
        statuses.pop_front().unwrap()
    } else {
        statuses.front().copied().unwrap_or("COMPLETED")
    }
}

/// A page of `Line_Item` rows cut from a table of `total` rows.
fn result_set(query: &str, total: usize) -> String {
    let number_after = |keyword: &str| -> usize {
        query
            .split(keyword)
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    };
    let limit = number_after("LIMIT ");
    let offset = number_after("OFFSET ");
    let end = total.min(offset + limit);

    let mut xml = String::from(
        r#"<columnTypes><labelName>Id</labelName></columnTypes><columnTypes><labelName>Name</labelName></columnTypes>"#,
    );
    for id in offset..end.max(offset) {
        xml.push_str(&format!(
            r#"<rows><values xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="NumberValue"><value>{id}</value></values><values xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="TextValue"><value>Line "{id}"</value></values></rows>"#
        ));
    }
    format!("<rval>{xml}</rval>")
}

fn fault(ns: &str) -> Response {
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Server</faultcode>
      <faultstring>[AuthenticationError.NETWORK_NOT_FOUND @ ]</faultstring>
      <detail>
        <ApiExceptionFault xmlns="{ns}">
          <message>[AuthenticationError.NETWORK_NOT_FOUND @ ]</message>
          <errors xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="AuthenticationError">
            <fieldPath></fieldPath>
            <trigger></trigger>
            <errorString>AuthenticationError.NETWORK_NOT_FOUND</errorString>
            <reason>NETWORK_NOT_FOUND</reason>
          </errors>
        </ApiExceptionFault>
      </detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#
    );
    xml_response(StatusCode::INTERNAL_SERVER_ERROR, body, false)
}

fn xml_response(status: StatusCode, body: String, gzip: bool) -> Response {
    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        return (
            status,
            [
                (header::CONTENT_TYPE, "text/xml; charset=utf-8"),
                (header::CONTENT_ENCODING, "gzip"),
            ],
            compressed,
        )
            .into_response();
    }
    (status, [(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body).into_response()
}
