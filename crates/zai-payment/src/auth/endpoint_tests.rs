//! Tests for the HTTP token endpoint.

use super::*;
use crate::config::Environment;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> ClientCredentials {
    ClientCredentials::new("test-client", "test-secret", "test-scope").unwrap()
}

fn endpoint_for(server: &MockServer) -> HttpTokenEndpoint {
    let config = ZaiConfig::new(Environment::Prelive, "test-client", "test-secret", "test-scope")
        .with_auth_base_url(server.uri());
    HttpTokenEndpoint::new(&config).expect("Should build endpoint")
}

#[test]
fn test_token_url_joins_base_and_path() {
    let endpoint = HttpTokenEndpoint::with_client(reqwest::Client::new(), "https://auth.test/");
    assert_eq!(endpoint.token_url(), "https://auth.test/tokens");
}

#[tokio::test]
async fn test_request_token_sends_client_credentials_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": "test-client",
            "client_secret": "test-secret",
            "scope": "test-scope"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = endpoint_for(&server)
        .request_token(&credentials())
        .await
        .expect("Should obtain token");

    assert_eq!(response.access_token, "fresh-token");
    assert_eq!(response.token_type.as_deref(), Some("Bearer"));
    assert_eq!(response.expires_in, Some(3600));
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "invalid_client"})),
        )
        .mount(&server)
        .await;

    let error = endpoint_for(&server)
        .request_token(&credentials())
        .await
        .expect_err("Should be rejected");

    match error {
        AuthError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid_client");
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let error = endpoint_for(&server)
        .request_token(&credentials())
        .await
        .expect_err("Should fail to parse");

    assert!(matches!(error, AuthError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_slow_endpoint_surfaces_network_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(serde_json::json!({"access_token": "late", "expires_in": 60})),
        )
        .mount(&server)
        .await;

    let config = ZaiConfig::new(Environment::Prelive, "id", "secret", "scope")
        .with_auth_base_url(server.uri())
        .with_timeout(Duration::from_secs(1));
    let endpoint = HttpTokenEndpoint::new(&config).unwrap();

    let error = endpoint
        .request_token(&credentials())
        .await
        .expect_err("Should time out");

    assert!(matches!(
        error,
        AuthError::Network(NetworkError::Timeout { .. })
    ));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_unreachable_endpoint_surfaces_network_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let endpoint =
        HttpTokenEndpoint::with_client(reqwest::Client::new(), "http://127.0.0.1:9");

    let error = endpoint
        .request_token(&credentials())
        .await
        .expect_err("Should fail to connect");

    assert!(matches!(error, AuthError::Network(_)));
}
