//! Runs every provider/file pass of one invocation.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use assetsync_client::{ItemMutator, ItemSource, Pacer};

use crate::archive::Archiver;
use crate::discovery::{discover_providers, Provider};
use crate::error::DiscoveryError;
use crate::executor::ActionExecutor;
use crate::pass::{FilePass, PassCounts, PassSummary};

/// Where to look and how to behave.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub dry_run: bool,
    pub archive: bool,
    /// Only these providers, when non-empty.
    pub providers: Vec<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            data_dir: PathBuf::from("data"),
            dry_run: false,
            archive: true,
            providers: Vec::new(),
        }
    }
}

/// Aggregate of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub providers_seen: usize,
    /// Provider name and why it was skipped.
    pub providers_skipped: Vec<(String, String)>,
    pub passes: Vec<PassSummary>,
    /// File path and why its pass failed.
    pub failed_passes: Vec<(PathBuf, String)>,
    pub totals: PassCounts,
}

/// Drives the passes of all providers sequentially.
pub struct SyncRunner {
    settings: RunSettings,
    pass: FilePass,
}

impl SyncRunner {
    #[must_use]
    pub fn new(
        source: Arc<dyn ItemSource>,
        mutator: Arc<dyn ItemMutator>,
        pacer: Pacer,
        settings: RunSettings,
    ) -> Self {
        let executor =
            ActionExecutor::new(mutator, Arc::new(pacer)).with_dry_run(settings.dry_run);
        let pass = FilePass::new(source, executor, Archiver::new(settings.archive));
        Self { settings, pass }
    }

    /// Process all providers.
    ///
    /// Fails only when the config directory cannot be listed; everything
    /// below that is absorbed and recorded in the report.
    pub async fn run(&self) -> Result<RunReport, DiscoveryError> {
        let providers = discover_providers(&self.settings.config_dir, &self.settings.data_dir)?;
        let mut report = RunReport::default();

        for provider in providers.iter().filter(|p| self.is_selected(p)) {
            report.providers_seen += 1;
            self.run_provider(provider, &mut report).await;
        }

        for wanted in &self.settings.providers {
            if !providers.iter().any(|p| &p.name == wanted) {
                warn!(provider = %wanted, "Requested provider has no config directory");
            }
        }

        let t = &report.totals;
        info!(
            providers = report.providers_seen,
            providers_skipped = report.providers_skipped.len(),
            files = report.passes.len(),
            failed_files = report.failed_passes.len(),
            records_read = t.records_read,
            values_pushed = t.values_pushed,
            attributes_rewritten = t.attributes_rewritten,
            retired = t.retired,
            creation_candidates = t.creation_candidates,
            failed_mutations = t.failed_mutations,
            planned_mutations = t.planned_mutations,
            archive_failures = t.archive_failures,
            "Run complete"
        );
        Ok(report)
    }

    fn is_selected(&self, provider: &Provider) -> bool {
        self.settings.providers.is_empty() || self.settings.providers.contains(&provider.name)
    }

    async fn run_provider(&self, provider: &Provider, report: &mut RunReport) {
        let config = match provider.load_config() {
            Ok(config) => config,
            Err(e) => {
                warn!(provider = %provider.name, error = %e, "Skipping provider");
                report
                    .providers_skipped
                    .push((provider.name.clone(), e.to_string()));
                return;
            }
        };

        let files = match provider.data_files() {
            Ok(files) => files,
            Err(e) => {
                warn!(provider = %provider.name, error = %e, "Skipping provider");
                report
                    .providers_skipped
                    .push((provider.name.clone(), e.to_string()));
                return;
            }
        };

        if files.is_empty() {
            info!(provider = %provider.name, "No record files to process");
        }

        for file in files {
            match self.pass.run(&provider.name, &config, &file).await {
                Ok(summary) => {
                    report.totals += summary.counts;
                    report.passes.push(summary);
                }
                Err(e) => {
                    error!(
                        provider = %provider.name,
                        file = %file.display(),
                        error = %e,
                        "Pass failed"
                    );
                    report.failed_passes.push((file, e.to_string()));
                }
            }
        }
    }
}
