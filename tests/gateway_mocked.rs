/// Integration tests with a mocked ledger provider
/// Drives the full router (CORS, body limit, dispatch) without hitting the real sandbox
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use regex::Regex;
use rust_wallet_gateway::config::Config;
use rust_wallet_gateway::gateway::{Gateway, MISSING_API_KEY};
use rust_wallet_gateway::handlers::AppState;
use rust_wallet_gateway::server::{build_router, LEGACY_GATEWAY_PATH};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{
    any, body_partial_json, header as header_matcher, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to build the app against a mock ledger
fn create_test_app(ledger_url: String, api_key: Option<&str>) -> Router {
    let config = Config::for_ledger(ledger_url, api_key.map(str::to_string));
    let gateway = Gateway::from_config(&config).unwrap();
    let state = Arc::new(AppState::new(config, gateway));
    build_router(state, false).unwrap()
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_balance_is_reshaped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ledger/accounts/lacc_A/balances"))
        .and(header_matcher("authorization", "Bearer sk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "available": { "amount": 100000, "currency": "COP" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(app, Method::GET, "/api?action=balance&account_id=lacc_A", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_id"], "lacc_A");
    assert_eq!(body["available_amount"], 100000);
    assert_eq!(body["currency"], "COP");
    assert_eq!(body["pending"], Value::Null);
}

#[tokio::test]
async fn test_balance_defaults_when_available_missing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ledger/accounts/lacc_A/balances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::POST,
        "/api?action=balance",
        Some(json!({ "account_id": "lacc_A" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_amount"], 0);
    assert_eq!(body["currency"], "COP");
}

#[tokio::test]
async fn test_topup_generates_external_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ledger/accounts/lacc_A/balance"))
        .and(body_partial_json(json!({
            "amount": { "amount": 50000, "currency": "COP" },
            "operation": "topup"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "bop_1",
            "operation": "topup"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::POST,
        "/api?action=topup",
        Some(json!({ "account_id": "lacc_A", "amount": 50000 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "bop_1");

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let pattern = Regex::new(r"^ext_\d+_\d+$").unwrap();
    assert!(pattern.is_match(sent["external_id"].as_str().unwrap()));
}

#[tokio::test]
async fn test_topup_keeps_supplied_external_id_and_string_amount() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ledger/accounts/lacc_A/balance"))
        .and(body_partial_json(json!({
            "amount": { "amount": 1 },
            "external_id": "my-key"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "bop_2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, _) = call(
        app,
        Method::POST,
        "/api?action=topup",
        Some(json!({ "account_id": "lacc_A", "amount": "1", "external_id": "my-key" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_topup_rejects_non_positive_amount() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    for amount in [json!(0), json!(-5), json!("abc")] {
        let app = create_test_app(mock_server.uri(), Some("sk_test"));
        let (status, body) = call(
            app,
            Method::POST,
            "/api?action=topup",
            Some(json!({ "account_id": "lacc_A", "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "amount must be > 0");
    }
}

#[tokio::test]
async fn test_transfer_forwards_source_amount_and_default_description() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ledger/transfers"))
        .and(body_partial_json(json!({
            "payer_account_id": "lacc_A",
            "receiving_account_id": "lacc_B",
            "source_amount": { "amount": 10000, "currency": "COP" },
            "description": "Transfer"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "trx_1" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::POST,
        "/api?action=transfer",
        Some(json!({
            "payer_account_id": "lacc_A",
            "receiving_account_id": "lacc_B",
            "amount": 10000
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "trx_1");
}

#[tokio::test]
async fn test_transfer_to_same_account_makes_no_upstream_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::POST,
        "/api?action=transfer",
        Some(json!({
            "payer_account_id": "lacc_A",
            "receiving_account_id": "lacc_A",
            "amount": 10000
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "payer_account_id and receiving_account_id must be different"
    );
}

#[tokio::test]
async fn test_mutating_actions_require_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    for action in ["topup", "transfer", "create_card"] {
        let app = create_test_app(mock_server.uri(), Some("sk_test"));
        let uri = format!("/api?action={}", action);
        let (status, body) = call(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn test_upstream_error_is_mirrored() {
    let mock_server = MockServer::start().await;

    let upstream_error = json!({ "errors": [{ "code": "insufficient_funds" }] });
    Mock::given(method("POST"))
        .and(path("/v1/ledger/transfers"))
        .respond_with(ResponseTemplate::new(422).set_body_json(&upstream_error))
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::POST,
        "/api?action=transfer",
        Some(json!({
            "payer_account_id": "lacc_A",
            "receiving_account_id": "lacc_B",
            "amount": 10
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, upstream_error);
}

#[tokio::test]
async fn test_non_json_upstream_error_is_wrapped_as_raw() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/cards"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(app, Method::GET, "/api?action=cards", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "raw": "Bad Gateway" }));
}

#[tokio::test]
async fn test_cards_defaults_and_reshape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/cards"))
        .and(query_param("page_number", "1"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(app, Method::GET, "/api?action=cards", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "pagination": null, "cards": [] }));
}

#[tokio::test]
async fn test_activity_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ledger/accounts/lacc_A/transactions"))
        .and(query_param("page_number", "2"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transactions": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::GET,
        "/api?action=activity&account_id=lacc_A&page_number=2",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "transactions": [] }));
}

#[tokio::test]
async fn test_create_card_omits_empty_nickname() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ledger/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "car_1" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::POST,
        "/api?action=create_card",
        Some(json!({
            "configuration_group_id": "ccg_1",
            "account_id": "lacc_A",
            "cardholder": { "first_name": "Valentina" },
            "nickname": ""
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "car_1");

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("nickname").is_none());
    assert_eq!(sent["cardholder"]["first_name"], "Valentina");
}

#[tokio::test]
async fn test_missing_key_fails_without_upstream_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), None);
    let (status, body) = call(app, Method::GET, "/api?action=balance&account_id=lacc_A", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": MISSING_API_KEY }));
}

#[tokio::test]
async fn test_options_without_key_is_ok() {
    let app = create_test_app("http://127.0.0.1:9".to_string(), None);
    let (status, body) = call(app, Method::OPTIONS, "/api?action=topup", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_cors_header_and_legacy_path() {
    let app = create_test_app("http://127.0.0.1:9".to_string(), Some("sk_test"));
    let uri = format!("{}?action=health", LEGACY_GATEWAY_PATH);
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app("http://127.0.0.1:9".to_string(), None);
    let (status, body) = call(app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_repeated_query_keys_keep_first_value() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ledger/accounts/lacc_A/balances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let (status, body) = call(
        app,
        Method::GET,
        "/api?action=balance&account_id=lacc_A&account_id=lacc_B",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_id"], "lacc_A");
}

#[tokio::test]
async fn test_repeated_query_keys_without_key_still_report_missing_key() {
    let app = create_test_app("http://127.0.0.1:9".to_string(), None);
    let (status, body) = call(
        app,
        Method::GET,
        "/api?action=balance&account_id=a&account_id=b",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": MISSING_API_KEY }));
}

#[tokio::test]
async fn test_oversized_body_is_rejected_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(mock_server.uri(), Some("sk_test"));
    let padding = "x".repeat(2 * 1024 * 1024);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api?action=topup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "account_id": "lacc_A", "amount": 1, "note": padding }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Request body exceeds 1048576 bytes" }));
}

#[tokio::test]
async fn test_mutating_actions_validate_before_calling_ledger() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let holder = json!({ "first_name": "Valentina" });
    let cases = [
        (
            "create_card",
            json!({ "account_id": "lacc_A", "cardholder": holder }),
            "configuration_group_id is required",
        ),
        (
            "create_card",
            json!({ "configuration_group_id": "ccg_1", "cardholder": holder }),
            "account_id is required",
        ),
        (
            "create_card",
            json!({ "configuration_group_id": "ccg_1", "account_id": "lacc_A" }),
            "cardholder is required",
        ),
        (
            "create_card",
            json!({ "configuration_group_id": "ccg_1", "account_id": "lacc_A", "cardholder": "Valentina" }),
            "cardholder must be an object",
        ),
        (
            "transfer",
            json!({ "receiving_account_id": "lacc_B", "amount": 10 }),
            "payer_account_id is required",
        ),
        (
            "transfer",
            json!({ "payer_account_id": "lacc_A", "amount": 10 }),
            "receiving_account_id is required",
        ),
        (
            "transfer",
            json!({ "payer_account_id": "lacc_A", "receiving_account_id": "lacc_B" }),
            "amount must be > 0",
        ),
        (
            "topup",
            json!({ "amount": 10 }),
            "account_id is required",
        ),
        (
            "topup",
            json!({ "account_id": "lacc_A" }),
            "amount must be > 0",
        ),
    ];

    for (action, payload, expected) in cases {
        let app = create_test_app(mock_server.uri(), Some("sk_test"));
        let uri = format!("/api?action={}", action);
        let (status, body) = call(app, Method::POST, &uri, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", action, expected);
        assert_eq!(body, json!({ "error": expected }));
    }
}

#[tokio::test]
async fn test_topups_without_external_id_get_distinct_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ledger/accounts/lacc_A/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "bop" })))
        .expect(2)
        .mount(&mock_server)
        .await;

    for _ in 0..2 {
        let app = create_test_app(mock_server.uri(), Some("sk_test"));
        let (status, _) = call(
            app,
            Method::POST,
            "/api?action=topup",
            Some(json!({ "account_id": "lacc_A", "amount": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let requests = mock_server.received_requests().await.unwrap();
    let ids: Vec<String> = requests
        .iter()
        .map(|r| {
            let sent: Value = serde_json::from_slice(&r.body).unwrap();
            sent["external_id"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}
