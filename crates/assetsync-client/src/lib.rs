//! assetsync HTTP client
//!
//! Signed access to the portfolio asset API used by the reconciliation engine.
//!
//! # Modules
//!
//! - [`auth`] - HMAC-SHA256 request signing
//! - [`client`] - reqwest-based [`AssetApiClient`]
//! - [`fetcher`] - portfolio → item traversal ([`ItemSource`] impl)
//! - [`mutator`] - value pushes and attribute rewrites ([`ItemMutator`] impl)
//! - [`models`] - wire types
//! - [`rate_limit`] - pacing of mutation calls
//! - [`retry`] - exponential backoff for transient failures
//! - [`traits`] - capability traits consumed by the reconciliation crate

pub mod auth;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod mutator;
pub mod rate_limit;
pub mod retry;
pub mod traits;

pub use auth::{ApiCredentials, RequestSigner};
pub use client::AssetApiClient;
pub use error::{ApiError, ApiResult, FetchError, MutationError, MutationKind};
pub use fetcher::FetchedItems;
pub use models::{AttributeRewrite, ItemId, ItemValue, Portfolio, PortfolioId, RemoteItem};
pub use rate_limit::{Pacer, TokenBucket};
pub use retry::RetryPolicy;
pub use traits::{ItemMutator, ItemSource};
