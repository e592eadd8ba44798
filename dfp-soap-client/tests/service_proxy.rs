mod common;

use std::sync::Arc;

use axum::http::Method;
use common::{APPLICATION_NAME, Mock, NETWORK_CODE, TOKEN};
use dfp_soap_client::{ClientError, Element, GZIP_SUFFIX, InMemoryCache, LIBRARY_SIGNATURE};

#[tokio::test]
async fn test_call_sends_identification_headers() {
    let mock = Mock::default().start().await;
    let client = common::client();

    let network_service = client
        .get_service("NetworkService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap();
    assert_eq!(network_service.service_name(), "NetworkService");
    assert_eq!(network_service.version(), "v202408");

    let network = network_service
        .call("getCurrentNetwork", vec![])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(network.child_text("networkCode"), Some(NETWORK_CODE));
    assert_eq!(network.child_text("displayName"), Some("Mock & Co"));

    let requests = mock.requests();
    let post = requests.iter().find(|r| r.method == Method::POST).unwrap();
    assert_eq!(
        post.headers.get("authorization").unwrap(),
        &format!("Bearer {TOKEN}")
    );
    assert_eq!(post.headers.get("soapaction").unwrap(), "\"\"");
    assert!(
        post.headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/xml")
    );

    let envelope = Element::parse(&post.body).unwrap();
    let header = envelope
        .child("Header")
        .and_then(|h| h.child("RequestHeader"))
        .unwrap();
    assert_eq!(header.child_text("networkCode"), Some(NETWORK_CODE));
    assert_eq!(
        header.child_text("applicationName"),
        Some(format!("{APPLICATION_NAME}{LIBRARY_SIGNATURE}").as_str())
    );
    assert_eq!(mock.soap_operations(), vec!["getCurrentNetwork"]);
}

#[tokio::test]
async fn test_unknown_operation_is_not_sent() {
    let mock = Mock::default().start().await;
    let client = common::client();
    let network_service = client
        .get_service("NetworkService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap();

    let err = network_service
        .call("deleteEverything", vec![])
        .await
        .unwrap_err();
    match err {
        ClientError::UnknownOperation { service, operation } => {
            assert_eq!(service, "NetworkService");
            assert_eq!(operation, "deleteEverything");
        }
        other => panic!("expected UnknownOperation, got {other:?}"),
    }
    assert!(mock.soap_operations().is_empty());
}

#[tokio::test]
async fn test_fault_carries_api_errors() {
    let mock = Mock::default().start().await;
    let client = common::client();
    let network_service = client
        .get_service("NetworkService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap();

    let err = network_service
        .call("makeTestNetwork", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Fault { .. }), "got {err:?}");
    assert!(err.to_string().contains("NETWORK_NOT_FOUND"));
    let errors = err.api_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason.as_deref(), Some("NETWORK_NOT_FOUND"));
    assert_eq!(
        errors[0].error_string.as_deref(),
        Some("AuthenticationError.NETWORK_NOT_FOUND")
    );
}

#[tokio::test]
async fn test_unknown_service_in_known_version() {
    let mock = Mock::default().start().await;
    let client = common::client();

    let err = client
        .get_service("NoSuchService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap_err();
    match err {
        ClientError::UnknownService { service, version, known } => {
            assert_eq!(service, "NoSuchService");
            assert_eq!(version, "v202408");
            assert!(known.iter().any(|s| s == "NetworkService"));
        }
        other => panic!("expected UnknownService, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_version() {
    let mock = Mock::default().start().await;
    let client = common::client();

    let err = client
        .get_service("NetworkService", Some("v199901"), Some(&mock.base))
        .await
        .unwrap_err();
    match err {
        ClientError::UnknownVersion { version, known } => {
            assert_eq!(version, "v199901");
            assert!(known.iter().any(|v| v == "v202408"));
        }
        other => panic!("expected UnknownVersion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_catalogued_service_fetch_failure() {
    let mock = Mock::default().start().await;
    let client = common::client();

    // Catalogued, but the mock does not serve it.
    let err = client
        .get_service("ForecastService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap_err();
    match err {
        ClientError::DescriptionFetchFailed { url, source } => {
            assert!(url.ends_with("/apis/ads/publisher/v202408/ForecastService?wsdl"));
            assert!(matches!(*source, ClientError::Http { status: 404, .. }));
        }
        other => panic!("expected DescriptionFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cache_avoids_refetch() {
    let mock = Mock::default().start().await;
    let cache = Arc::new(InMemoryCache::new());
    let client = common::builder().cache(cache.clone()).build().unwrap();

    for _ in 0..2 {
        client
            .get_service("NetworkService", Some("v202408"), Some(&mock.base))
            .await
            .unwrap();
    }
    assert_eq!(mock.wsdl_fetches(), 1);
    assert_eq!(cache.len(), 1);

    // Failed fetches are not cached.
    let _ = client
        .get_service("ForecastService", Some("v202408"), Some(&mock.base))
        .await;
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_no_cache_fetches_every_time() {
    let mock = Mock::default().start().await;
    let client = common::client();
    for _ in 0..2 {
        client
            .get_service("NetworkService", Some("v202408"), Some(&mock.base))
            .await
            .unwrap();
    }
    assert_eq!(mock.wsdl_fetches(), 2);
}

#[tokio::test]
async fn test_compressed_responses() {
    let mock = Mock::default().start().await;
    let client = common::builder().enable_compression(true).build().unwrap();
    let network_service = client
        .get_service("NetworkService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap();

    let network = network_service
        .call("getCurrentNetwork", vec![])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(network.child_text("networkCode"), Some(NETWORK_CODE));

    let requests = mock.requests();
    let post = requests.iter().find(|r| r.method == Method::POST).unwrap();
    assert!(
        post.headers
            .get("accept-encoding")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("gzip")
    );
    let envelope = Element::parse(&post.body).unwrap();
    let application_name = envelope
        .child("Header")
        .and_then(|h| h.child("RequestHeader"))
        .and_then(|h| h.child_text("applicationName"))
        .unwrap();
    assert!(application_name.ends_with(GZIP_SUFFIX));
}

#[tokio::test]
async fn test_custom_headers_on_every_request() {
    let mock = Mock::default().start().await;
    let client = common::builder()
        .custom_http_header("X-Trace", "abc")
        .build()
        .unwrap();
    let network_service = client
        .get_service("NetworkService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap();
    network_service
        .call("getCurrentNetwork", vec![])
        .await
        .unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert_eq!(request.headers.get("x-trace").unwrap(), "abc");
    }
}

#[tokio::test]
async fn test_config_file_client() {
    let mock = Mock::default().start().await;
    let yaml = format!(
        "ad_manager:\n  application_name: {APPLICATION_NAME}\n  network_code: {NETWORK_CODE}\n  access_token: {TOKEN}\n"
    );
    let client = dfp_soap_client::DfpClient::load_from_str(&yaml).unwrap();
    assert_eq!(client.network_code(), Some(NETWORK_CODE));

    let network_service = client
        .get_service("NetworkService", Some("v202408"), Some(&mock.base))
        .await
        .unwrap();
    assert!(
        network_service
            .call("getCurrentNetwork", vec![])
            .await
            .unwrap()
            .is_some()
    );
}
