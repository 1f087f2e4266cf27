//! Asset API HTTP client (reqwest-based).
//!
//! Wraps `reqwest::Client` with request signing, the API path prefix, retry
//! and status handling. Higher-level operations live in [`crate::fetcher`]
//! and [`crate::mutator`].

use crate::auth::{RequestSigner, API_KEY_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::{ApiError, ApiResult};
use crate::models::{DataEnvelope, ItemId, Portfolio, PortfolioDetail, PortfolioId, RemoteItem};
use crate::retry::RetryPolicy;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API path prefix.
pub const DEFAULT_API_PREFIX: &str = "/api/v3";

/// Signed client for the portfolio asset API.
#[derive(Debug, Clone)]
pub struct AssetApiClient {
    /// Scheme and authority of the API (e.g., "<https://assets.example.com>").
    base_url: String,
    /// Versioned path prefix, part of every signed path.
    prefix: String,
    signer: RequestSigner,
    http_client: Client,
    retry: RetryPolicy,
    timeout_secs: u64,
}

impl AssetApiClient {
    /// Create a new client.
    pub fn new(
        base_url: impl Into<String>,
        prefix: impl Into<String>,
        signer: RequestSigner,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("assetsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(base_url, prefix, signer, http_client)
            .with_timeout_secs(timeout.as_secs()))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        base_url: impl Into<String>,
        prefix: impl Into<String>,
        signer: RequestSigner,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            prefix: normalize_prefix(&prefix.into()),
            signer,
            http_client,
            retry: RetryPolicy::default(),
            timeout_secs: 30,
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // ── Endpoints ─────────────────────────────────────────────────────

    /// `GET /data/portfolio`
    pub async fn list_portfolios(&self) -> ApiResult<Vec<Portfolio>> {
        let envelope: DataEnvelope<Vec<Portfolio>> =
            self.get_json("list portfolios", "/data/portfolio").await?;
        Ok(envelope.data)
    }

    /// `GET /data/portfolio/{id}`
    pub async fn portfolio_items(&self, portfolio_id: &PortfolioId) -> ApiResult<Vec<RemoteItem>> {
        let route = format!("/data/portfolio/{}", path_segment(portfolio_id.as_str()));
        let envelope: DataEnvelope<PortfolioDetail> =
            self.get_json("fetch portfolio", &route).await?;
        Ok(envelope.data.asset)
    }

    /// `POST /data/item/{id}` with an arbitrary JSON body.
    pub async fn post_item<B: Serialize>(&self, item_id: &ItemId, body: &B) -> ApiResult<()> {
        let route = format!("/data/item/{}", path_segment(item_id.as_str()));
        let payload = serde_json::to_vec(body)?;
        self.send("update item", Method::POST, &route, &payload)
            .await
            .map(|_| ())
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, route: &str) -> ApiResult<T> {
        let body = self.send(operation, Method::GET, route, &[]).await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Parse(format!("{operation}: {e}")))
    }

    async fn send(
        &self,
        operation: &str,
        method: Method,
        route: &str,
        payload: &[u8],
    ) -> ApiResult<String> {
        let path = format!("{}{}", self.prefix, route);
        let path_ref: &str = &path;
        self.retry
            .execute(operation, move || {
                self.send_once(method.clone(), path_ref, payload)
            })
            .await
    }

    /// One signed attempt. The signature is computed here so every retry gets
    /// a fresh timestamp.
    async fn send_once(&self, method: Method, path: &str, payload: &[u8]) -> ApiResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let signed = self.signer.sign_now(method.as_str(), path, payload);
        debug!(method = %method, path = %path, timestamp = signed.timestamp, "Asset API request");

        let mut builder = self
            .http_client
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, self.signer.api_key())
            .header(TIMESTAMP_HEADER, signed.timestamp.to_string())
            .header(SIGNATURE_HEADER, signed.signature);
        if !payload.is_empty() {
            builder = builder.body(payload.to_vec());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e, self.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| ApiError::from_transport(&e, self.timeout_secs));
        }

        Err(self.error_from_response(response).await)
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn error_from_response(&self, response: reqwest::Response) -> ApiError {
        let status = response.status();

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let detail = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(status = status.as_u16(), "Asset API rejected request signature");
                ApiError::AuthRejected {
                    status: status.as_u16(),
                    detail,
                }
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Asset API rate limited, retry after {:?}s", retry_after);
                ApiError::RateLimited {
                    retry_after_secs: retry_after,
                }
            }
            _ => ApiError::Status {
                status: status.as_u16(),
                detail,
            },
        }
    }
}

/// Percent-encodes an identifier for use as one path segment.
///
/// The encoded form is what goes on the wire, so it is also what gets signed.
fn path_segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

/// `"api/v3/"` → `"/api/v3"`, `""` stays empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
