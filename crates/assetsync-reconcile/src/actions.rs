//! Output of one reconciliation.

use assetsync_client::{AttributeRewrite, ItemId, ItemValue};

use crate::identity::CompositeKey;
use crate::local::LocalRecord;
use crate::tag::format_tag;

/// A matched item to bring in line with its local record.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAction {
    pub item_id: ItemId,
    pub key: CompositeKey,
    /// `None` when the record carries no value; the push is then skipped.
    pub value: Option<ItemValue>,
    /// Set when the item's tag still lives in its name.
    pub rewrite: Option<AttributeRewrite>,
}

/// A local record with no remote counterpart. Reported, never created.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationCandidate {
    pub key: CompositeKey,
    pub record: LocalRecord,
}

impl CreationCandidate {
    /// The tag the item should carry once created.
    #[must_use]
    pub fn tag(&self) -> String {
        format_tag(&self.key)
    }
}

/// A managed item whose key no longer appears locally.
#[derive(Debug, Clone, PartialEq)]
pub struct RetirementAction {
    pub item_id: ItemId,
    pub key: CompositeKey,
    /// Zero shaped like the item's current value.
    pub value: ItemValue,
}

/// Counters of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub local_records: usize,
    pub remote_items: usize,
    /// Local records with a remote counterpart.
    pub matched: usize,
    pub creation_candidates: usize,
    pub retirements: usize,
    /// Remote items without a tag; never matched nor retired.
    pub unmanaged_items: usize,
    /// Tagged remote items shadowed by an earlier item with the same key.
    pub duplicate_remote_keys: usize,
}

/// Everything a pass has to do, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionSet {
    /// In local record order.
    pub updates: Vec<UpdateAction>,
    pub creations: Vec<CreationCandidate>,
    /// In remote item order.
    pub retirements: Vec<RetirementAction>,
    pub stats: MatchStats,
}

impl ActionSet {
    /// Whether executing this set would issue no calls.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.retirements.is_empty()
            && self
                .updates
                .iter()
                .all(|u| u.value.is_none() && u.rewrite.is_none())
    }
}
