//! Integration tests for the HTTP fetch layer.
//!
//! These tests verify fetch-and-decode against wiremock servers.

mod support;
use support::socket_guard::start_mock_server_or_skip;

use charsniff_core::detect::{DetectionSource, EncodingResolver, StatisticalProbe};
use charsniff_core::http::{CharsetClient, FetchError};
use futures_util::StreamExt;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_body(server: &MockServer, route: &str, content_type: Option<&str>, body: Vec<u8>) {
    let mut template = ResponseTemplate::new(200).set_body_bytes(body);
    if let Some(content_type) = content_type {
        template = template.insert_header("Content-Type", content_type);
    }
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_decodes_declared_euc_jp() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let (body, _, _) = encoding_rs::EUC_JP.encode("<p>こんにちは、世界</p>");
    mount_body(&server, "/euc", Some("text/html; charset=EUC-JP"), body.into_owned()).await;

    let response = CharsetClient::new()
        .fetch(&format!("{}/euc", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.detection().name, "euc-jp");
    assert!(response.detection().certain);
    assert_eq!(response.text().await.unwrap(), "<p>こんにちは、世界</p>");
}

#[tokio::test]
async fn test_fetch_unknown_charset_falls_back_to_meta() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = format!(
        "<html><head><meta charset=\"euc-jp\"></head><body>{}</body></html>",
        "こんにちは、世界".repeat(200)
    );
    let (body, _, _) = encoding_rs::EUC_JP.encode(&page);
    mount_body(&server, "/page", Some("text/html; charset=unknown"), body.into_owned()).await;

    let response = CharsetClient::new()
        .fetch(&format!("{}/page", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.detection().source, DetectionSource::MetaPrescan);
    assert_eq!(response.text().await.unwrap(), page);
}

#[tokio::test]
async fn test_fetch_statistical_probe_without_declarations() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let text = "日本語のウェブページです。文字コードを判定します。".repeat(20);
    let (body, _, _) = encoding_rs::SHIFT_JIS.encode(&text);
    mount_body(&server, "/sjis", Some("text/html"), body.into_owned()).await;

    let client = CharsetClient::new()
        .with_resolver(EncodingResolver::with_probe(StatisticalProbe::chardetng()));
    let response = client
        .fetch(&format!("{}/sjis", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.detection().name, "shift_jis");
    assert!(!response.detection().certain);
    assert_eq!(response.text().await.unwrap(), text);
}

#[tokio::test]
async fn test_fetch_utf8_body_is_passed_through() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let text = "Grüße aus München";
    mount_body(&server, "/utf8", None, text.as_bytes().to_vec()).await;

    let response = CharsetClient::new()
        .fetch(&format!("{}/utf8", server.uri()))
        .await
        .unwrap();
    assert!(response.detection().encoding.is_identity());
    assert_eq!(response.text().await.unwrap(), text);
}

#[tokio::test]
async fn test_fetch_empty_body_is_not_an_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/empty", Some("text/html; charset=euc-jp"), Vec::new()).await;

    let response = CharsetClient::new()
        .fetch(&format!("{}/empty", server.uri()))
        .await
        .unwrap();
    let chunks: Vec<_> = response.into_body().collect().await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn test_fetch_large_body_streams_in_chunks() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let text = "Ελληνικό κείμενο. ".repeat(10_000);
    let (body, _, _) = encoding_rs::ISO_8859_7.encode(&text);
    mount_body(&server, "/greek", Some("text/plain; charset=iso-8859-7"), body.into_owned()).await;

    let response = CharsetClient::new()
        .fetch(&format!("{}/greek", server.uri()))
        .await
        .unwrap();
    let mut decoded = Vec::new();
    let mut body = response.into_body();
    while let Some(chunk) = body.next().await {
        decoded.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(String::from_utf8(decoded).unwrap(), text);
}

#[tokio::test]
async fn test_fetch_404_returns_http_status_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = CharsetClient::new()
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::HttpStatus { status: 404, .. }),
        "expected HttpStatus 404, got {err:?}"
    );
}

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let response = CharsetClient::new()
        .fetch(&format!("{}/ua", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_fetch_connection_refused_is_network_error() {
    // Port 9 (discard) is assumed closed on test machines.
    let err = CharsetClient::new_with_timeouts(2, 5)
        .fetch("http://127.0.0.1:9/")
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::Network { .. } | FetchError::Timeout { .. }),
        "expected network failure, got {err:?}"
    );
}

#[tokio::test]
async fn test_fetch_rejects_unsupported_scheme() {
    let err = CharsetClient::new()
        .fetch("file:///etc/hosts")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}
