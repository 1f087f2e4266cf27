//! In-memory stand-ins for the asset API.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use assetsync_client::{
    ApiError, AttributeRewrite, FetchError, FetchedItems, ItemId, ItemMutator, ItemSource,
    ItemValue, MutationError, MutationKind, PortfolioId, RemoteItem,
};

/// Serves a fixed remote baseline.
#[derive(Default)]
pub struct FakeItemSource {
    items: Vec<RemoteItem>,
    failed_portfolios: Vec<String>,
    listing_fails: bool,
    calls: AtomicUsize,
}

impl FakeItemSource {
    pub fn with_items(items: Vec<RemoteItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            listing_fails: true,
            ..Default::default()
        }
    }

    pub fn with_failed_portfolio(mut self, portfolio_id: &str) -> Self {
        self.failed_portfolios.push(portfolio_id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemSource for FakeItemSource {
    async fn fetch_all_items(&self) -> Result<FetchedItems, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails {
            return Err(FetchError::Listing {
                source: ApiError::Status {
                    status: 503,
                    detail: "maintenance".to_string(),
                },
            });
        }
        Ok(FetchedItems {
            items: self.items.clone(),
            portfolios_total: 1 + self.failed_portfolios.len(),
            failed: self
                .failed_portfolios
                .iter()
                .map(|id| FetchError::Portfolio {
                    portfolio_id: PortfolioId::from(id.as_str()),
                    source: ApiError::Status {
                        status: 500,
                        detail: "boom".to_string(),
                    },
                })
                .collect(),
        })
    }
}

/// A call received by [`RecordingMutator`].
#[derive(Debug, Clone, PartialEq)]
pub enum MutatorCall {
    Push(String, ItemValue),
    Rewrite(String, AttributeRewrite),
}

/// Records every call; fails calls for selected item ids.
#[derive(Default)]
pub struct RecordingMutator {
    calls: Mutex<Vec<MutatorCall>>,
    failing: HashSet<String>,
}

impl RecordingMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| (*s).to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<MutatorCall> {
        self.calls.lock().unwrap().clone()
    }

    fn result(&self, item_id: &ItemId, kind: MutationKind) -> Result<(), MutationError> {
        if self.failing.contains(item_id.as_str()) {
            return Err(MutationError::new(
                item_id.clone(),
                kind,
                ApiError::AuthRejected {
                    status: 403,
                    detail: "signature mismatch".to_string(),
                },
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemMutator for RecordingMutator {
    async fn push_value(&self, item_id: &ItemId, value: &ItemValue) -> Result<(), MutationError> {
        self.calls
            .lock()
            .unwrap()
            .push(MutatorCall::Push(item_id.to_string(), value.clone()));
        self.result(item_id, MutationKind::PushValue)
    }

    async fn rewrite_attributes(
        &self,
        item_id: &ItemId,
        attributes: &AttributeRewrite,
    ) -> Result<(), MutationError> {
        self.calls
            .lock()
            .unwrap()
            .push(MutatorCall::Rewrite(item_id.to_string(), attributes.clone()));
        self.result(item_id, MutationKind::RewriteAttributes)
    }
}
