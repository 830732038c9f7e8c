//! Tests for error types.

use super::*;
use reqwest::header::{HeaderValue, RETRY_AFTER};

// ============================================================================
// Status Mapping Tests
// ============================================================================

/// Verify that each documented status maps onto its own error kind.
#[test]
fn test_from_status_maps_known_statuses() {
    let headers = HeaderMap::new();

    assert!(matches!(
        ApiError::from_status(400, &headers, ""),
        ApiError::BadRequest { .. }
    ));
    assert!(matches!(
        ApiError::from_status(401, &headers, ""),
        ApiError::Unauthorized { .. }
    ));
    assert!(matches!(
        ApiError::from_status(403, &headers, ""),
        ApiError::Forbidden { .. }
    ));
    assert!(matches!(
        ApiError::from_status(404, &headers, ""),
        ApiError::NotFound { .. }
    ));
    assert!(matches!(
        ApiError::from_status(422, &headers, ""),
        ApiError::Validation { .. }
    ));
    assert!(matches!(
        ApiError::from_status(429, &headers, ""),
        ApiError::RateLimited { .. }
    ));
    assert!(matches!(
        ApiError::from_status(503, &headers, ""),
        ApiError::Server { status: 503, .. }
    ));
}

/// Verify that unmapped statuses keep the status and raw body.
#[test]
fn test_from_status_unmapped_status_keeps_body() {
    let error = ApiError::from_status(409, &HeaderMap::new(), "conflict happened");

    match error {
        ApiError::Unexpected {
            status,
            message,
            body,
        } => {
            assert_eq!(status, 409);
            assert_eq!(message, "HTTP 409");
            assert_eq!(body, "conflict happened");
        }
        other => panic!("Expected Unexpected, got {:?}", other),
    }
}

/// Verify the status accessor round-trips through the mapping.
#[test]
fn test_status_accessor() {
    let headers = HeaderMap::new();
    for status in [400u16, 401, 403, 404, 418, 422, 429, 500, 502] {
        assert_eq!(
            ApiError::from_status(status, &headers, "").status(),
            Some(status)
        );
    }

    let decode = ApiError::Decode {
        message: "bad".to_string(),
    };
    assert_eq!(decode.status(), None);
}

// ============================================================================
// Message Extraction Tests
// ============================================================================

mod message_tests {
    use super::*;

    #[test]
    fn test_message_from_error_field() {
        let error =
            ApiError::from_status(401, &HeaderMap::new(), r#"{"error":"invalid_token"}"#);
        assert_eq!(error.to_string(), "Unauthorized: invalid_token");
    }

    #[test]
    fn test_message_from_message_field() {
        let error = ApiError::from_status(
            404,
            &HeaderMap::new(),
            r#"{"message":"User not found"}"#,
        );
        assert_eq!(error.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_message_from_nested_errors_field() {
        let body = r#"{"errors":{"email":["is invalid","is taken"]}}"#;
        let error = ApiError::from_status(422, &HeaderMap::new(), body);

        match error {
            ApiError::Validation { message } => {
                assert_eq!(message, "email is invalid, is taken");
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_error_field_preferred_over_message() {
        let body = r#"{"error":"first","message":"second"}"#;
        let error = ApiError::from_status(400, &HeaderMap::new(), body);
        assert_eq!(error.to_string(), "Bad request: first");
    }

    #[test]
    fn test_falls_back_to_status_for_non_json_body() {
        let error = ApiError::from_status(500, &HeaderMap::new(), "<html>oops</html>");
        assert_eq!(error.to_string(), "Server error: 500 - HTTP 500");
    }

    #[test]
    fn test_falls_back_to_status_for_empty_error_fields() {
        let error = ApiError::from_status(400, &HeaderMap::new(), r#"{"error":"","errors":[]}"#);
        assert_eq!(error.to_string(), "Bad request: HTTP 400");
    }
}

// ============================================================================
// Retry-After and Transience Tests
// ============================================================================

#[test]
fn test_rate_limit_reads_retry_after_header() {
    let mut headers = HeaderMap::new();
    headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

    match ApiError::from_status(429, &headers, "") {
        ApiError::RateLimited { retry_after, .. } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("Expected RateLimited, got {:?}", other),
    }
}

#[test]
fn test_rate_limit_ignores_http_date_retry_after() {
    let mut headers = HeaderMap::new();
    headers.insert(
        RETRY_AFTER,
        HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
    );

    match ApiError::from_status(429, &headers, "") {
        ApiError::RateLimited { retry_after, .. } => assert_eq!(retry_after, None),
        other => panic!("Expected RateLimited, got {:?}", other),
    }
}

/// Verify that callers can distinguish "retry later" from "fix credentials".
#[test]
fn test_error_transience() {
    let network: Error = NetworkError::Timeout {
        message: "read timed out".to_string(),
    }
    .into();
    assert!(network.is_transient());

    let rejected: Error = AuthError::Rejected {
        status: 401,
        message: "invalid_client".to_string(),
    }
    .into();
    assert!(!rejected.is_transient());

    let auth_server_down: Error = AuthError::Rejected {
        status: 503,
        message: "unavailable".to_string(),
    }
    .into();
    assert!(auth_server_down.is_transient());

    let auth_network: Error = AuthError::Network(NetworkError::Connection {
        message: "refused".to_string(),
    })
    .into();
    assert!(auth_network.is_transient());

    let config: Error = ConfigError::MissingField {
        field: "client_id".to_string(),
    }
    .into();
    assert!(!config.is_transient());

    let validation: Error = ValidationError::Required {
        field: "email".to_string(),
    }
    .into();
    assert!(!validation.is_transient());

    let server: Error = ApiError::from_status(502, &HeaderMap::new(), "").into();
    assert!(server.is_transient());

    let not_found: Error = ApiError::from_status(404, &HeaderMap::new(), "").into();
    assert!(!not_found.is_transient());
}
