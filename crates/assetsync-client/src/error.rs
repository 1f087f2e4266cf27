//! Error types for the asset API client.

use std::fmt;

use thiserror::Error;

use crate::models::{ItemId, PortfolioId};

pub type ApiResult<T> = Result<T, ApiError>;

/// A single failed exchange with the asset API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure that is not a timeout or refused connection.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The request exceeded the client timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The API host could not be reached.
    #[error("API unreachable: {0}")]
    Unreachable(String),

    /// The API rejected the signature or API key (401/403).
    #[error("Signature rejected ({status}): {detail}")]
    AuthRejected { status: u16, detail: String },

    /// The API asked us to slow down (429).
    #[error("Rate limited by API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status.
    #[error("API returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body did not match the expected shape.
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// The client could not be built from its configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Retries were exhausted on a transient failure.
    #[error("{message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl ApiError {
    /// Transient failures worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Unreachable(_) | Self::RateLimited { .. }
        )
    }

    /// 5xx responses.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 500)
    }

    /// Whether the API refused our credentials or signature.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::AuthRejected { .. })
    }

    pub(crate) fn from_transport(error: &reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout { timeout_secs }
        } else if error.is_connect() {
            Self::Unreachable(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

/// Failure to obtain the remote baseline.
///
/// `Listing` aborts the pass; `Portfolio` is recorded and the traversal
/// continues without that portfolio's items.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("portfolio listing failed: {source}")]
    Listing {
        #[source]
        source: ApiError,
    },

    #[error("fetching portfolio {portfolio_id} failed: {source}")]
    Portfolio {
        portfolio_id: PortfolioId,
        #[source]
        source: ApiError,
    },
}

impl FetchError {
    /// The underlying API error.
    #[must_use]
    pub fn api_error(&self) -> &ApiError {
        match self {
            Self::Listing { source } | Self::Portfolio { source, .. } => source,
        }
    }
}

/// Which write was attempted against an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    PushValue,
    RewriteAttributes,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushValue => f.write_str("value push"),
            Self::RewriteAttributes => f.write_str("attribute rewrite"),
        }
    }
}

/// A single item write that did not go through.
#[derive(Debug, Error)]
#[error("{kind} failed for item {item_id}: {source}")]
pub struct MutationError {
    pub item_id: ItemId,
    pub kind: MutationKind,
    #[source]
    pub source: ApiError,
}

impl MutationError {
    #[must_use]
    pub fn new(item_id: ItemId, kind: MutationKind, source: ApiError) -> Self {
        Self {
            item_id,
            kind,
            source,
        }
    }
}
