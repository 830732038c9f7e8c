//! Tests for API response decoding.

use super::*;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: String,
}

fn ok_response(body: serde_json::Value) -> ApiResponse {
    ApiResponse::new(200, HeaderMap::new(), body)
}

#[test]
fn test_envelope_decodes_named_key() {
    let response = ok_response(json!({"users": {"id": "u1"}, "webhooks": {"id": "w1"}}));

    let user: Item = response.envelope("users").unwrap();
    let webhook: Item = response.envelope("webhooks").unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(webhook.id, "w1");
}

#[test]
fn test_envelope_missing_key_is_decode_error() {
    let response = ok_response(json!({"items": {"id": "x"}}));

    let result: Result<Item, _> = response.envelope("users");

    match result {
        Err(ApiError::Decode { message }) => assert!(message.contains("users")),
        other => panic!("Expected Decode error, got {:?}", other),
    }
}

#[test]
fn test_envelope_shape_mismatch_is_decode_error() {
    let response = ok_response(json!({"users": {"id": 42}}));

    let result: Result<Item, _> = response.envelope("users");

    assert!(matches!(result, Err(ApiError::Decode { .. })));
}

#[test]
fn test_from_text_empty_body_is_null() {
    let response = ApiResponse::from_text(204, HeaderMap::new(), "").unwrap();

    assert_eq!(response.status(), 204);
    assert!(response.body().is_null());
}

#[test]
fn test_from_text_invalid_json() {
    let result = ApiResponse::from_text(200, HeaderMap::new(), "<html>");
    assert!(matches!(result, Err(ApiError::Decode { .. })));
}

#[test]
fn test_json_decodes_whole_body() {
    let response = ok_response(json!({"id": "abc"}));
    assert_eq!(response.json::<Item>().unwrap(), Item { id: "abc".into() });
}

#[test]
fn test_meta_parsing() {
    let response = ok_response(json!({
        "users": [],
        "meta": {"limit": 10, "offset": 20, "total": 45}
    }));

    assert_eq!(
        response.meta(),
        Some(ListMeta {
            limit: 10,
            offset: 20,
            total: Some(45)
        })
    );
    assert_eq!(ok_response(json!({"users": []})).meta(), None);
}

#[test]
fn test_page_has_more_with_total() {
    let page = Page {
        items: vec![1, 2, 3],
        meta: ListMeta {
            limit: 3,
            offset: 0,
            total: Some(5),
        },
    };

    assert!(page.has_more());
    assert_eq!(page.next_offset(), 3);

    let last = Page {
        items: vec![4, 5],
        meta: ListMeta {
            limit: 3,
            offset: 3,
            total: Some(5),
        },
    };
    assert!(!last.has_more());
}

#[test]
fn test_page_has_more_without_total() {
    let full = Page {
        items: vec![1, 2],
        meta: ListMeta {
            limit: 2,
            offset: 0,
            total: None,
        },
    };
    let partial = Page {
        items: vec![1],
        meta: ListMeta {
            limit: 2,
            offset: 0,
            total: None,
        },
    };

    assert!(full.has_more());
    assert!(!partial.has_more());
}
