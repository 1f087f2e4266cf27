//! Applies an [`ActionSet`] through an [`ItemMutator`].
//!
//! Updates run first in local record order, then retirements in remote
//! order. Every failure is logged and counted; nothing aborts the pass.

use std::sync::Arc;
use tracing::{debug, info, warn};

use assetsync_client::{AttributeRewrite, ItemId, ItemMutator, ItemValue, MutationError, Pacer};

use crate::actions::ActionSet;

/// Outcome counters of one execution.
///
/// A dry run issues nothing, so only `planned`, `missing_values` and
/// `failed_mutations` (for missing values) move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub values_pushed: usize,
    pub attributes_rewritten: usize,
    pub retired: usize,
    /// Failed calls plus matched records that had no value to push.
    pub failed_mutations: usize,
    /// Pushes skipped because the record had no value.
    pub missing_values: usize,
    /// Calls a dry run would have issued.
    pub planned: usize,
}

enum Outcome {
    Applied,
    Planned,
    Failed,
}

impl ExecutionReport {
    /// Counts planned and failed calls; true for an applied one.
    fn settle(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Applied => true,
            Outcome::Planned => {
                self.planned += 1;
                false
            }
            Outcome::Failed => {
                self.failed_mutations += 1;
                false
            }
        }
    }
}

/// Issues the calls of an [`ActionSet`], one at a time.
pub struct ActionExecutor {
    mutator: Arc<dyn ItemMutator>,
    pacer: Arc<Pacer>,
    dry_run: bool,
}

impl ActionExecutor {
    #[must_use]
    pub fn new(mutator: Arc<dyn ItemMutator>, pacer: Arc<Pacer>) -> Self {
        Self {
            mutator,
            pacer,
            dry_run: false,
        }
    }

    /// Log the planned calls instead of issuing them.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn execute(&self, actions: &ActionSet) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for update in &actions.updates {
            self.pace().await;

            match &update.value {
                Some(value) => {
                    let outcome = self.push(&update.item_id, value).await;
                    if report.settle(outcome) {
                        report.values_pushed += 1;
                    }
                }
                None => {
                    warn!(
                        item_id = %update.item_id,
                        key = %update.key,
                        "Matched record has no value, push skipped"
                    );
                    report.missing_values += 1;
                    report.failed_mutations += 1;
                }
            }

            if let Some(rewrite) = &update.rewrite {
                let outcome = self.rewrite(&update.item_id, rewrite).await;
                if report.settle(outcome) {
                    report.attributes_rewritten += 1;
                }
            }
        }

        for retirement in &actions.retirements {
            self.pace().await;

            info!(item_id = %retirement.item_id, key = %retirement.key, "Retiring item");
            let outcome = self.push(&retirement.item_id, &retirement.value).await;
            if report.settle(outcome) {
                report.retired += 1;
            }
        }

        report
    }

    async fn pace(&self) {
        if !self.dry_run {
            self.pacer.pace().await;
        }
    }

    async fn push(&self, item_id: &ItemId, value: &ItemValue) -> Outcome {
        if self.dry_run {
            info!(item_id = %item_id, value = ?value, "Dry run: would push value");
            return Outcome::Planned;
        }
        match self.mutator.push_value(item_id, value).await {
            Ok(()) => {
                debug!(item_id = %item_id, "Value pushed");
                Outcome::Applied
            }
            Err(e) => {
                log_failure(&e);
                Outcome::Failed
            }
        }
    }

    async fn rewrite(&self, item_id: &ItemId, rewrite: &AttributeRewrite) -> Outcome {
        if self.dry_run {
            info!(
                item_id = %item_id,
                name = %rewrite.name,
                description = %rewrite.description,
                "Dry run: would rewrite attributes"
            );
            return Outcome::Planned;
        }
        match self.mutator.rewrite_attributes(item_id, rewrite).await {
            Ok(()) => {
                info!(item_id = %item_id, name = %rewrite.name, "Tag moved to description");
                Outcome::Applied
            }
            Err(e) => {
                log_failure(&e);
                Outcome::Failed
            }
        }
    }
}

fn log_failure(error: &MutationError) {
    warn!(
        item_id = %error.item_id,
        kind = %error.kind,
        auth_rejected = error.source.is_auth_rejection(),
        error = %error.source,
        "Item mutation failed"
    );
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("pacer", &self.pacer)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
