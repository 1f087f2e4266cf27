//! Capability traits for the remote side of a reconciliation pass.
//!
//! [`crate::AssetApiClient`] implements both; the reconciliation crate is
//! written against the traits so passes can run against in-memory fakes.

use async_trait::async_trait;

use crate::error::{FetchError, MutationError};
use crate::fetcher::FetchedItems;
use crate::models::{AttributeRewrite, ItemId, ItemValue};

/// Capability for reading the full remote baseline.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch every item of every portfolio.
    ///
    /// Fails only when the portfolio listing itself cannot be read. Failures
    /// for individual portfolios are reported in [`FetchedItems::failed`].
    async fn fetch_all_items(&self) -> Result<FetchedItems, FetchError>;
}

/// Capability for writing to single remote items.
#[async_trait]
pub trait ItemMutator: Send + Sync {
    /// Replace the value of one item.
    async fn push_value(&self, item_id: &ItemId, value: &ItemValue) -> Result<(), MutationError>;

    /// Patch the name/description of one item.
    async fn rewrite_attributes(
        &self,
        item_id: &ItemId,
        attributes: &AttributeRewrite,
    ) -> Result<(), MutationError>;
}
