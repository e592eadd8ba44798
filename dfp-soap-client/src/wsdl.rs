//! The parts of a service description the proxy needs.

use std::collections::BTreeSet;

use dfp_soap_core::{Element, XmlError};

/// Namespace, operations and endpoint of one service, read from its WSDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    /// `targetNamespace` of the definitions; request bodies are qualified
    /// with it.
    pub namespace: String,
    /// Operation names declared by the port types.
    pub operations: BTreeSet<String>,
    /// `soap:address location` of the first port.
    pub endpoint: String,
}

impl ServiceDescription {
    pub fn parse(document: &str) -> Result<Self, XmlError> {
        Self::from_element(&Element::parse(document)?)
    }

    pub fn from_element(definitions: &Element) -> Result<Self, XmlError> {
        if definitions.name() != "definitions" {
            return Err(XmlError::Unexpected(format!(
                "expected WSDL definitions, found <{}>",
                definitions.name()
            )));
        }

        let namespace = definitions
            .attribute("targetNamespace")
            .ok_or_else(|| XmlError::MissingElement("definitions@targetNamespace".into()))?
            .to_string();

        let operations: BTreeSet<String> = definitions
            .children_named("portType")
            .flat_map(|port_type| port_type.children_named("operation"))
            .filter_map(|operation| operation.attribute("name"))
            .map(str::to_string)
            .collect();

        let endpoint = definitions
            .children_named("service")
            .flat_map(|service| service.children_named("port"))
            .filter_map(|port| port.child("address"))
            .find_map(|address| address.attribute("location"))
            .ok_or_else(|| XmlError::MissingElement("service/port/address@location".into()))?
            .to_string();

        Ok(Self {
            namespace,
            operations,
            endpoint,
        })
    }

    pub fn has_operation(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:wsdlsoap="http://schemas.xmlsoap.org/wsdl/soap/"
    targetNamespace="https://www.google.com/apis/ads/publisher/v202408">
  <wsdl:types/>
  <wsdl:portType name="ReportServiceInterface">
    <wsdl:operation name="runReportJob"/>
    <wsdl:operation name="getReportJobStatus"/>
    <wsdl:operation name="getReportDownloadUrlWithOptions"/>
  </wsdl:portType>
  <wsdl:binding name="ReportServiceSoapBinding" type="ReportServiceInterface">
    <wsdl:operation name="runReportJob"/>
  </wsdl:binding>
  <wsdl:service name="ReportService">
    <wsdl:port name="ReportServiceInterfacePort" binding="ReportServiceSoapBinding">
      <wsdlsoap:address location="https://ads.google.com/apis/ads/publisher/v202408/ReportService"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_parse_description() {
        let description = ServiceDescription::parse(WSDL).unwrap();
        assert_eq!(
            description.namespace,
            "https://www.google.com/apis/ads/publisher/v202408"
        );
        assert_eq!(
            description.endpoint,
            "https://ads.google.com/apis/ads/publisher/v202408/ReportService"
        );
        assert_eq!(description.operations.len(), 3);
        assert!(description.has_operation("getReportJobStatus"));
        assert!(!description.has_operation("getReportJob"));
    }

    #[test]
    fn test_missing_endpoint() {
        let wsdl = r#"<definitions targetNamespace="urn:x"><portType name="P"/></definitions>"#;
        assert!(matches!(
            ServiceDescription::parse(wsdl),
            Err(XmlError::MissingElement(_))
        ));
    }

    #[test]
    fn test_not_a_wsdl() {
        assert!(matches!(
            ServiceDescription::parse("<html><body>Not Found</body></html>"),
            Err(XmlError::Unexpected(_))
        ));
    }
}
