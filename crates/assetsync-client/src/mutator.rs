//! Writes against single remote items.
//!
//! Both operations go through `POST /data/item/{id}`. Any non-success status
//! is a [`MutationError`], the same as a transport failure.

use async_trait::async_trait;
use tracing::debug;

use crate::client::AssetApiClient;
use crate::error::{MutationError, MutationKind};
use crate::models::{AttributeRewrite, ItemId, ItemValue, ValuePatch};
use crate::traits::ItemMutator;

#[async_trait]
impl ItemMutator for AssetApiClient {
    async fn push_value(&self, item_id: &ItemId, value: &ItemValue) -> Result<(), MutationError> {
        debug!(item_id = %item_id, "Pushing item value");
        self.post_item(item_id, &ValuePatch { value })
            .await
            .map_err(|e| MutationError::new(item_id.clone(), MutationKind::PushValue, e))
    }

    async fn rewrite_attributes(
        &self,
        item_id: &ItemId,
        attributes: &AttributeRewrite,
    ) -> Result<(), MutationError> {
        debug!(item_id = %item_id, "Rewriting item attributes");
        self.post_item(item_id, attributes)
            .await
            .map_err(|e| MutationError::new(item_id.clone(), MutationKind::RewriteAttributes, e))
    }
}
