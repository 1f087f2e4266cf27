//! Mock asset API using wiremock for integration testing.
//!
//! Every mounted mock verifies the request signature, so a test passes only
//! if the client signs exactly what it sends.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use assetsync_client::auth::{compute_signature, ApiCredentials, RequestSigner};
use assetsync_client::client::AssetApiClient;
use assetsync_client::retry::RetryPolicy;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";
pub const PREFIX: &str = "/api/v3";

/// Matches requests whose `x-signature` is valid for the test credentials.
pub struct ValidSignature;

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let Some(timestamp) = request
            .headers
            .get("x-timestamp")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
        else {
            return false;
        };
        let Some(signature) = request
            .headers
            .get("x-signature")
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        let expected = compute_signature(
            API_KEY,
            API_SECRET,
            timestamp,
            request.method.as_str(),
            request.url.path(),
            &request.body,
        );
        expected == signature
    }
}

/// A wiremock server speaking the asset API.
pub struct MockAssetServer {
    server: MockServer,
}

impl MockAssetServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Client with valid credentials and no retries.
    pub fn client(&self) -> AssetApiClient {
        self.client_with(ApiCredentials::new(API_KEY, API_SECRET), RetryPolicy::disabled())
    }

    pub fn client_with(&self, credentials: ApiCredentials, retry: RetryPolicy) -> AssetApiClient {
        AssetApiClient::with_http_client(
            self.uri(),
            PREFIX,
            RequestSigner::new(credentials),
            reqwest::Client::new(),
        )
        .with_retry_policy(retry)
    }

    // =========================================================================
    // Read endpoints
    // =========================================================================

    pub async fn mock_portfolio_listing(&self, ids: &[Value]) {
        let data: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        Mock::given(method("GET"))
            .and(path(format!("{PREFIX}/data/portfolio")))
            .and(header("x-api-token", API_KEY))
            .and(ValidSignature)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_portfolio_listing_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("{PREFIX}/data/portfolio")))
            .respond_with(ResponseTemplate::new(status).set_body_string("listing unavailable"))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_portfolio_items(&self, portfolio_id: &str, items: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{PREFIX}/data/portfolio/{portfolio_id}")))
            .and(ValidSignature)
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "asset": items } })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_portfolio_status(&self, portfolio_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("{PREFIX}/data/portfolio/{portfolio_id}")))
            .respond_with(ResponseTemplate::new(status).set_body_string("portfolio error"))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Write endpoints
    // =========================================================================

    pub async fn mock_item_update_ok(&self, item_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("{PREFIX}/data/item/{item_id}")))
            .and(header("content-type", "application/json"))
            .and(ValidSignature)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_item_update_status(&self, item_id: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(format!("{PREFIX}/data/item/{item_id}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Bodies of all POST requests received so far, parsed as JSON.
    pub async fn posted_bodies(&self) -> Vec<(String, Value)> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .map(|r| {
                let body = serde_json::from_slice(&r.body).unwrap_or(Value::Null);
                (r.url.path().to_string(), body)
            })
            .collect()
    }
}
