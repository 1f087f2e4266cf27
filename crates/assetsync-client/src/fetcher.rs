//! Two-level traversal of the remote inventory: portfolios, then items.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::AssetApiClient;
use crate::error::FetchError;
use crate::models::RemoteItem;
use crate::traits::ItemSource;

/// Merged remote baseline for one pass.
#[derive(Debug, Default)]
pub struct FetchedItems {
    /// All items of all portfolios that could be read, in listing order.
    pub items: Vec<RemoteItem>,
    /// Number of portfolios in the listing.
    pub portfolios_total: usize,
    /// Portfolios whose items are missing from `items`.
    pub failed: Vec<FetchError>,
}

impl FetchedItems {
    /// Whether some portfolios could not be read.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[async_trait]
impl ItemSource for AssetApiClient {
    async fn fetch_all_items(&self) -> Result<FetchedItems, FetchError> {
        let portfolios = self
            .list_portfolios()
            .await
            .map_err(|source| FetchError::Listing { source })?;

        debug!(count = portfolios.len(), "Fetched portfolio listing");

        let mut fetched = FetchedItems {
            portfolios_total: portfolios.len(),
            ..Default::default()
        };

        for portfolio in portfolios {
            match self.portfolio_items(&portfolio.id).await {
                Ok(items) => {
                    debug!(portfolio_id = %portfolio.id, count = items.len(), "Fetched portfolio items");
                    fetched.items.extend(items);
                }
                Err(source) => {
                    warn!(
                        portfolio_id = %portfolio.id,
                        error = %source,
                        "Portfolio could not be fetched, its items are excluded"
                    );
                    fetched.failed.push(FetchError::Portfolio {
                        portfolio_id: portfolio.id,
                        source,
                    });
                }
            }
        }

        info!(
            portfolios = fetched.portfolios_total,
            failed_portfolios = fetched.failed.len(),
            items = fetched.items.len(),
            "Remote baseline fetched"
        );

        Ok(fetched)
    }
}
