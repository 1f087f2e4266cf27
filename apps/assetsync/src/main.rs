//! assetsync - reconciles provider record files against the asset API.
//!
//! For every provider under the config directory and every CSV file in its
//! data directory: fetch the remote inventory, match records by their
//! embedded composite key, push values, normalize tags, retire orphans,
//! report creation candidates and archive the file.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assetsync_client::{AssetApiClient, ItemMutator, ItemSource, Pacer, RequestSigner, RetryPolicy};
use assetsync_reconcile::{RunSettings, SyncRunner};

mod config;
mod logging;

use config::AppConfig;

/// Default environment file, relative to the working directory.
const DEFAULT_ENV_FILE: &str = "config/.env";

/// assetsync - portfolio asset reconciliation
#[derive(Parser, Debug)]
#[command(name = "assetsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Environment file loaded before reading configuration
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Only process this provider (repeatable)
    #[arg(long = "provider", value_name = "NAME")]
    providers: Vec<String>,

    /// Plan and report without writing to the API
    #[arg(long)]
    dry_run: bool,

    /// Leave processed files in place
    #[arg(long)]
    no_archive: bool,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("failed to load environment file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::AppConfigError),

    #[error(transparent)]
    LogSink(#[from] logging::LogSinkError),

    #[error("failed to create API client: {0}")]
    Client(#[from] assetsync_client::ApiError),

    #[error(transparent)]
    Discovery(#[from] assetsync_reconcile::DiscoveryError),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("assetsync: {e}");
        tracing::error!(error = %e, "Run could not start");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    load_env_file(cli.env_file.as_ref())?;

    let mut config = AppConfig::from_env()?;
    config.dry_run |= cli.dry_run;
    config.archive &= !cli.no_archive;

    logging::init_logging(config.log_format, &config.log_file)?;

    tracing::info!(
        base_url = %config.base_url,
        api_prefix = %config.api_prefix,
        config_dir = %config.config_dir.display(),
        data_dir = %config.data_dir.display(),
        dry_run = config.dry_run,
        archive = config.archive,
        "Starting assetsync"
    );

    let client = AssetApiClient::new(
        config.base_url.clone(),
        config.api_prefix.clone(),
        RequestSigner::new(config.credentials.clone()),
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_retry_policy(RetryPolicy::new(
        config.max_retries,
        config.retry_base_delay_secs,
    ));
    let client = Arc::new(client);

    let pacer = match config.rate_per_minute {
        Some(rate) => Pacer::per_minute(rate),
        None => Pacer::fixed(Duration::from_millis(config.pace_ms)),
    };

    let settings = RunSettings {
        config_dir: config.config_dir.clone(),
        data_dir: config.data_dir.clone(),
        dry_run: config.dry_run,
        archive: config.archive,
        providers: cli.providers,
    };

    let source: Arc<dyn ItemSource> = client.clone();
    let mutator: Arc<dyn ItemMutator> = client;
    let report = SyncRunner::new(source, mutator, pacer, settings).run().await?;

    if !report.failed_passes.is_empty() || !report.providers_skipped.is_empty() {
        tracing::warn!(
            failed_files = report.failed_passes.len(),
            skipped_providers = report.providers_skipped.len(),
            "Run finished with skipped work, see log above"
        );
    }
    Ok(())
}

/// Load the explicit env file, or the default one if it exists.
fn load_env_file(explicit: Option<&PathBuf>) -> Result<(), StartupError> {
    let (path, required) = match explicit {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_ENV_FILE), false),
    };
    if !required && !path.exists() {
        return Ok(());
    }
    dotenvy::from_path(&path)
        .map(|_| ())
        .map_err(|source| StartupError::EnvFile { path, source })
}
