//! One provider/file pass.
//!
//! Fetch the remote baseline, read the file, reconcile, execute, report
//! creation candidates, archive. A pass fails as a whole only when the
//! portfolio listing or the file itself cannot be read; the file is then
//! left in place for the next run. Once calls have been issued the pass
//! always yields its summary; an archive failure is counted there.

use chrono::Local;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use assetsync_client::ItemSource;

use crate::actions::ActionSet;
use crate::archive::Archiver;
use crate::engine::reconcile;
use crate::error::PassError;
use crate::executor::{ActionExecutor, ExecutionReport};
use crate::local::{CsvRecordSource, LocalRecord};
use crate::provider::ProviderConfig;

/// Attribute naming the portfolio a record belongs to, shown in creation reports.
pub const PORTFOLIO_ATTRIBUTE: &str = "clientNumber";

/// Counters of one pass; summed across passes for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounts {
    pub records_read: usize,
    pub rows_skipped: usize,
    pub matched: usize,
    pub values_pushed: usize,
    pub attributes_rewritten: usize,
    pub retired: usize,
    pub creation_candidates: usize,
    pub unmanaged_items: usize,
    pub duplicate_remote_keys: usize,
    pub failed_portfolios: usize,
    pub failed_mutations: usize,
    /// Calls a dry run would have issued.
    pub planned_mutations: usize,
    /// Files left in place because the move to `processed/` failed.
    pub archive_failures: usize,
}

impl AddAssign for PassCounts {
    fn add_assign(&mut self, other: Self) {
        self.records_read += other.records_read;
        self.rows_skipped += other.rows_skipped;
        self.matched += other.matched;
        self.values_pushed += other.values_pushed;
        self.attributes_rewritten += other.attributes_rewritten;
        self.retired += other.retired;
        self.creation_candidates += other.creation_candidates;
        self.unmanaged_items += other.unmanaged_items;
        self.duplicate_remote_keys += other.duplicate_remote_keys;
        self.failed_portfolios += other.failed_portfolios;
        self.failed_mutations += other.failed_mutations;
        self.planned_mutations += other.planned_mutations;
        self.archive_failures += other.archive_failures;
    }
}

/// Result of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub provider: String,
    pub file: PathBuf,
    pub counts: PassCounts,
    /// Where the file was moved, if archiving is enabled and succeeded.
    pub archived_to: Option<PathBuf>,
}

/// Shared collaborators of all passes in a run.
pub struct FilePass {
    source: Arc<dyn ItemSource>,
    executor: ActionExecutor,
    archiver: Archiver,
}

impl FilePass {
    #[must_use]
    pub fn new(source: Arc<dyn ItemSource>, executor: ActionExecutor, archiver: Archiver) -> Self {
        Self {
            source,
            executor,
            archiver,
        }
    }

    /// Run the pass for `file` of `provider`.
    pub async fn run(
        &self,
        provider: &str,
        config: &ProviderConfig,
        file: &Path,
    ) -> Result<PassSummary, PassError> {
        info!(provider = %provider, file = %file.display(), "Starting pass");

        let remote = self.source.fetch_all_items().await?;

        let record_source = CsvRecordSource::new(file, &config.column_mapping);
        let mut records = record_source.records()?;
        let local: Vec<LocalRecord> = records.by_ref().collect();
        let rows_skipped = records.skipped_rows();
        if rows_skipped > 0 {
            warn!(provider = %provider, file = %file.display(), rows_skipped, "Rows skipped");
        }

        let actions = reconcile(&local, &remote.items, config);
        report_creations(provider, &actions, config);

        let execution = self.executor.execute(&actions).await;
        let mut counts = pass_counts(&actions, &execution, rows_skipped, remote.failed.len());

        let archived_to = match self.archiver.archive(file, Local::now()).await {
            Ok(destination) => destination,
            Err(e) => {
                error!(
                    provider = %provider,
                    file = %file.display(),
                    error = %e,
                    "Failed to archive record file, leaving it in place"
                );
                counts.archive_failures += 1;
                None
            }
        };

        let summary = PassSummary {
            provider: provider.to_string(),
            file: file.to_path_buf(),
            counts,
            archived_to,
        };
        log_summary(&summary, self.executor.is_dry_run());
        Ok(summary)
    }
}

fn pass_counts(
    actions: &ActionSet,
    execution: &ExecutionReport,
    rows_skipped: usize,
    failed_portfolios: usize,
) -> PassCounts {
    PassCounts {
        records_read: actions.stats.local_records,
        rows_skipped,
        matched: actions.stats.matched,
        values_pushed: execution.values_pushed,
        attributes_rewritten: execution.attributes_rewritten,
        retired: execution.retired,
        creation_candidates: actions.stats.creation_candidates,
        unmanaged_items: actions.stats.unmanaged_items,
        duplicate_remote_keys: actions.stats.duplicate_remote_keys,
        failed_portfolios,
        failed_mutations: execution.failed_mutations,
        planned_mutations: execution.planned,
        archive_failures: 0,
    }
}

fn report_creations(provider: &str, actions: &ActionSet, config: &ProviderConfig) {
    for candidate in &actions.creations {
        let description = config
            .csv_asset_description_column
            .as_deref()
            .and_then(|column| candidate.record.get(column))
            .unwrap_or_default();
        info!(
            provider = %provider,
            tag = %candidate.tag(),
            portfolio = candidate.record.get(PORTFOLIO_ATTRIBUTE).unwrap_or_default(),
            description = description,
            "Creation candidate: no remote item carries this key"
        );
    }
}

fn log_summary(summary: &PassSummary, dry_run: bool) {
    let c = &summary.counts;
    info!(
        provider = %summary.provider,
        file = %summary.file.display(),
        dry_run,
        records_read = c.records_read,
        rows_skipped = c.rows_skipped,
        matched = c.matched,
        values_pushed = c.values_pushed,
        attributes_rewritten = c.attributes_rewritten,
        retired = c.retired,
        creation_candidates = c.creation_candidates,
        unmanaged_items = c.unmanaged_items,
        duplicate_remote_keys = c.duplicate_remote_keys,
        failed_portfolios = c.failed_portfolios,
        failed_mutations = c.failed_mutations,
        planned_mutations = c.planned_mutations,
        archive_failures = c.archive_failures,
        "Pass complete"
    );
}
