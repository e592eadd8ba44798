//! SOAP 1.1 envelopes.
//!
//! Requests are document/literal: the body holds one element named after
//! the operation, in the service namespace, whose children are the
//! arguments. Every request carries a `RequestHeader` with the network code
//! and application name.
//!
//! Responses hold either `<operation>Response` with zero or more `rval`
//! children, or a `Fault` whose detail lists API errors.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};

use crate::element::Element;
use crate::error::XmlError;

/// Namespace of the SOAP 1.1 envelope.
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of `xsi:type`.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The `SoapRequestHeader` sent with every call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestHeader {
    pub network_code: Option<String>,
    pub application_name: String,
}

impl RequestHeader {
    fn to_element(&self, namespace: &str) -> Element {
        let mut header = Element::new("RequestHeader").with_attribute("xmlns", namespace);
        if let Some(code) = &self.network_code {
            header.push_child(Element::text_element("networkCode", code.as_str()));
        }
        header.with_child(Element::text_element(
            "applicationName",
            self.application_name.as_str(),
        ))
    }
}

/// Encode a request envelope.
pub fn encode_request(
    namespace: &str,
    header: &RequestHeader,
    operation: &str,
    args: &[Element],
) -> Result<Vec<u8>, XmlError> {
    let envelope = Element::new("soapenv:Envelope")
        .with_attribute("xmlns:soapenv", SOAP_ENVELOPE_NS)
        .with_attribute("xmlns:xsi", XSI_NS)
        .with_child(Element::new("soapenv:Header").with_child(header.to_element(namespace)))
        .with_child(
            Element::new("soapenv:Body").with_child(
                Element::new(operation)
                    .with_attribute("xmlns", namespace)
                    .with_children(args.iter().cloned()),
            ),
        );

    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| XmlError::Write(e.to_string()))?;
    envelope.write_to(&mut writer)?;
    Ok(writer.into_inner())
}

/// The `ResponseHeader` returned with every call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseHeader {
    pub request_id: Option<String>,
    pub response_time: Option<String>,
}

/// One entry of an `ApiExceptionFault`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiError {
    /// The `xsi:type` of the error, e.g. `AuthenticationError`.
    pub error_type: Option<String>,
    pub error_string: Option<String>,
    pub field_path: Option<String>,
    pub trigger: Option<String>,
    pub reason: Option<String>,
}

impl ApiError {
    fn from_element(element: &Element) -> Self {
        let text = |name: &str| element.child_text(name).map(str::to_string);
        Self {
            error_type: element
                .attribute("type")
                .map(|t| t.rsplit_once(':').map_or(t, |(_, local)| local).to_string()),
            error_string: text("errorString"),
            field_path: text("fieldPath"),
            trigger: text("trigger"),
            reason: text("reason"),
        }
    }
}

/// A decoded SOAP fault.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoapFault {
    pub fault_code: Option<String>,
    pub message: String,
    pub errors: Vec<ApiError>,
}

/// Body of a decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// `rval` elements of the operation response, in order.
    Success(Vec<Element>),
    Fault(SoapFault),
}

/// A decoded response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapResponse {
    pub header: ResponseHeader,
    pub body: ResponseBody,
}

impl SoapResponse {
    pub fn is_fault(&self) -> bool {
        matches!(self.body, ResponseBody::Fault(_))
    }
}

/// Decode a response envelope.
pub fn decode_response(xml: &str) -> Result<SoapResponse, XmlError> {
    let root = Element::parse(xml)?;
    if root.name() != "Envelope" {
        return Err(XmlError::Unexpected(format!(
            "expected a SOAP Envelope, found <{}>",
            root.name()
        )));
    }

    let header = root
        .child("Header")
        .and_then(|h| h.child("ResponseHeader"))
        .map(|h| ResponseHeader {
            request_id: h.child_text("requestId").map(str::to_string),
            response_time: h.child_text("responseTime").map(str::to_string),
        })
        .unwrap_or_default();

    let body = root.require_child("Body")?;
    let payload = body
        .children()
        .first()
        .ok_or_else(|| XmlError::Unexpected("empty SOAP Body".into()))?;

    let body = if payload.name() == "Fault" {
        let errors = payload
            .child("detail")
            .and_then(|detail| detail.children().first())
            .map(|fault| fault.children_named("errors").map(ApiError::from_element).collect())
            .unwrap_or_default();
        ResponseBody::Fault(SoapFault {
            fault_code: payload.child_text("faultcode").map(str::to_string),
            message: payload.child_text("faultstring").unwrap_or_default().to_string(),
            errors,
        })
    } else {
        ResponseBody::Success(
            payload
                .children_named("rval")
                .cloned()
                .collect(),
        )
    };

    Ok(SoapResponse { header, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://www.google.com/apis/ads/publisher/v202408";

    #[test]
    fn test_encode_request_layout() {
        let header = RequestHeader {
            network_code: Some("1234".into()),
            application_name: "app (DfpApi-Rust)".into(),
        };
        let args = [Element::text_element("reportJobId", "42")];
        let bytes = encode_request(NS, &header, "getReportJobStatus", &args).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));

        let root = Element::parse(&xml).unwrap();
        let request_header = root.child("Header").unwrap().child("RequestHeader").unwrap();
        assert_eq!(request_header.child_text("networkCode"), Some("1234"));
        assert_eq!(request_header.child_text("applicationName"), Some("app (DfpApi-Rust)"));
        let op = root.child("Body").unwrap().child("getReportJobStatus").unwrap();
        assert_eq!(op.child_text("reportJobId"), Some("42"));
        assert!(xml.contains(&format!(r#"<getReportJobStatus xmlns="{NS}">"#)));
    }

    #[test]
    fn test_encode_request_without_network_code() {
        let header = RequestHeader {
            network_code: None,
            application_name: "app".into(),
        };
        let xml = String::from_utf8(encode_request(NS, &header, "getAllNetworks", &[]).unwrap()).unwrap();
        assert!(!xml.contains("networkCode"));
        assert!(xml.contains("<getAllNetworks"));
    }

    #[test]
    fn test_decode_success() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
          <soap:Header>
            <ResponseHeader xmlns="https://www.google.com/apis/ads/publisher/v202408">
              <requestId>abc123</requestId><responseTime>87</responseTime>
            </ResponseHeader>
          </soap:Header>
          <soap:Body>
            <getReportJobStatusResponse xmlns="https://www.google.com/apis/ads/publisher/v202408">
              <rval>COMPLETED</rval>
            </getReportJobStatusResponse>
          </soap:Body>
        </soap:Envelope>"#;
        let response = decode_response(xml).unwrap();
        assert_eq!(response.header.request_id.as_deref(), Some("abc123"));
        assert_eq!(response.header.response_time.as_deref(), Some("87"));
        let ResponseBody::Success(results) = response.body else {
            panic!("expected success");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text(), Some("COMPLETED"));
    }

    #[test]
    fn test_decode_void_response() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
          <soap:Body><performActionResponse/></soap:Body></soap:Envelope>"#;
        assert_eq!(decode_response(xml).unwrap().body, ResponseBody::Success(vec![]));
    }

    #[test]
    fn test_decode_fault() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
              xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
          <soap:Body>
            <soap:Fault>
              <faultcode>soap:Server</faultcode>
              <faultstring>[AuthenticationError.NETWORK_NOT_FOUND @ ]</faultstring>
              <detail>
                <ApiExceptionFault xmlns="https://www.google.com/apis/ads/publisher/v202408">
                  <message>[AuthenticationError.NETWORK_NOT_FOUND @ ]</message>
                  <errors xsi:type="AuthenticationError">
                    <fieldPath></fieldPath>
                    <trigger></trigger>
                    <errorString>AuthenticationError.NETWORK_NOT_FOUND</errorString>
                    <reason>NETWORK_NOT_FOUND</reason>
                  </errors>
                </ApiExceptionFault>
              </detail>
            </soap:Fault>
          </soap:Body>
        </soap:Envelope>"#;
        let response = decode_response(xml).unwrap();
        assert!(response.is_fault());
        let ResponseBody::Fault(fault) = response.body else {
            panic!("expected fault");
        };
        assert_eq!(fault.message, "[AuthenticationError.NETWORK_NOT_FOUND @ ]");
        assert_eq!(fault.fault_code.as_deref(), Some("soap:Server"));
        assert_eq!(fault.errors.len(), 1);
        assert_eq!(fault.errors[0].error_type.as_deref(), Some("AuthenticationError"));
        assert_eq!(fault.errors[0].reason.as_deref(), Some("NETWORK_NOT_FOUND"));
    }

    #[test]
    fn test_decode_rejects_non_envelope() {
        assert!(matches!(
            decode_response("<html><body>502</body></html>"),
            Err(XmlError::Unexpected(_))
        ));
    }
}
