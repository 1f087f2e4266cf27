//! assetsync reconciliation engine
//!
//! Matches local record files against the remote inventory by an anonymized
//! composite key embedded in the items' free-text fields, and applies the
//! resulting updates and retirements.
//!
//! # Modules
//!
//! - [`identity`] - composite key derivation
//! - [`tag`] - `{id:…}` tag extraction and formatting
//! - [`local`] - CSV record source
//! - [`provider`] - per-provider configuration
//! - [`engine`] - the pure match/diff step producing an [`ActionSet`]
//! - [`executor`] - applies an [`ActionSet`] through an [`assetsync_client::ItemMutator`]
//! - [`pass`] - one provider/file pass
//! - [`runner`] - all providers and files of a run

pub mod actions;
pub mod archive;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod executor;
pub mod identity;
pub mod local;
pub mod pass;
pub mod provider;
pub mod runner;
pub mod tag;

pub use actions::{ActionSet, CreationCandidate, MatchStats, RetirementAction, UpdateAction};
pub use archive::Archiver;
pub use discovery::{discover_providers, Provider};
pub use engine::reconcile;
pub use error::{ConfigError, DiscoveryError, ParseError, PassError};
pub use executor::{ActionExecutor, ExecutionReport};
pub use identity::{derive_key, CompositeKey};
pub use local::{CsvRecordSource, LocalRecord, LocalRecords};
pub use pass::{FilePass, PassCounts, PassSummary};
pub use provider::ProviderConfig;
pub use runner::{RunReport, RunSettings, SyncRunner};
pub use tag::{extract_key, format_tag, locate_key_source, KeySource};
