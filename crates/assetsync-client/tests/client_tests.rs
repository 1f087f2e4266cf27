//! Integration tests for the signed HTTP layer.

mod helpers;

use helpers::mock_asset_server::{MockAssetServer, API_KEY, API_SECRET, PREFIX};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use assetsync_client::auth::{compute_signature, ApiCredentials};
use assetsync_client::error::ApiError;
use assetsync_client::models::{ItemId, PortfolioId};
use assetsync_client::retry::RetryPolicy;

#[tokio::test]
async fn test_requests_carry_valid_signature_headers() {
    let server = MockAssetServer::new().await;
    server.mock_portfolio_listing(&[json!(1), json!("p-2")]).await;

    let client = server.client();
    let portfolios = client.list_portfolios().await.unwrap();

    assert_eq!(portfolios.len(), 2);
    assert_eq!(portfolios[0].id.as_str(), "1");
    assert_eq!(portfolios[1].id.as_str(), "p-2");

    let requests = server.server().received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.url.path(), format!("{PREFIX}/data/portfolio"));

    let header = |name: &str| {
        request
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap()
    };
    assert_eq!(header("x-api-token"), API_KEY);
    assert_eq!(header("content-type"), "application/json");

    let timestamp: i64 = header("x-timestamp").parse().unwrap();
    let expected = compute_signature(
        API_KEY,
        API_SECRET,
        timestamp,
        "GET",
        &format!("{PREFIX}/data/portfolio"),
        b"",
    );
    assert_eq!(header("x-signature"), expected);
}

#[tokio::test]
async fn test_wrong_secret_is_not_accepted_by_server() {
    let server = MockAssetServer::new().await;
    server.mock_portfolio_listing(&[json!(1)]).await;

    // Nothing matches the bad signature, so wiremock answers 404.
    let client = server.client_with(
        ApiCredentials::new(API_KEY, "wrong-secret"),
        RetryPolicy::disabled(),
    );
    let err = client.list_portfolios().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_portfolio_items_parsed_from_asset_array() {
    let server = MockAssetServer::new().await;
    server
        .mock_portfolio_items(
            "7",
            json!([
                { "id": 101, "name": "Laptop", "description": "{id:abc}", "value": 1200 },
                { "id": "102", "name": "Desk", "value": { "amount": 300, "currency": "EUR" } },
                { "id": 103 }
            ]),
        )
        .await;

    let client = server.client();
    let items = client
        .portfolio_items(&PortfolioId::from("7"))
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].id.as_str(), "101");
    assert_eq!(items[0].description.as_deref(), Some("{id:abc}"));
    assert_eq!(items[1].id.as_str(), "102");
    assert!(items[2].name.is_none());
    assert!(items[2].value.is_none());
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_rejected() {
    let server = MockAssetServer::new().await;
    server.mock_portfolio_listing_status(401).await;

    let err = server.client().list_portfolios().await.unwrap_err();
    assert!(err.is_auth_rejection());
    assert!(matches!(err, ApiError::AuthRejected { status: 401, .. }));
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let server = MockAssetServer::new().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/data/portfolio")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(server.server())
        .await;

    let err = server.client().list_portfolios().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::RateLimited {
            retry_after_secs: Some(7)
        }
    ));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockAssetServer::new().await;
    Mock::given(method("POST"))
        .and(path(format!("{PREFIX}/data/item/9")))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad value"))
        .expect(1)
        .mount(server.server())
        .await;

    let client = server.client_with(
        ApiCredentials::new(API_KEY, API_SECRET),
        RetryPolicy::new(3, 0),
    );
    let err = client
        .post_item(&ItemId::from("9"), &json!({ "value": 1 }))
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 422);
            assert_eq!(detail, "bad value");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried_until_success() {
    let server = MockAssetServer::new().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/data/portfolio")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(server.server())
        .await;
    server.mock_portfolio_listing(&[json!(5)]).await;

    let client = server.client_with(
        ApiCredentials::new(API_KEY, API_SECRET),
        RetryPolicy::new(2, 0),
    );
    let portfolios = client.list_portfolios().await.unwrap();
    assert_eq!(portfolios.len(), 1);

    let requests = server.server().received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_exhausted_retries_report_attempts() {
    let server = MockAssetServer::new().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/data/portfolio")))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(server.server())
        .await;

    let client = server.client_with(
        ApiCredentials::new(API_KEY, API_SECRET),
        RetryPolicy::new(2, 0),
    );
    let err = client.list_portfolios().await.unwrap_err();
    assert!(matches!(err, ApiError::MaxRetriesExceeded { attempts: 3, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockAssetServer::new().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/data/portfolio")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(server.server())
        .await;

    let err = server.client().list_portfolios().await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}
