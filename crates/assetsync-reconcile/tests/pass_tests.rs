//! End-to-end tests of a single provider/file pass against fakes.

mod helpers;

use helpers::fakes::{FakeItemSource, MutatorCall, RecordingMutator};
use helpers::fixtures::{
    acme_key, name_tagged_item, tagged_item, Workspace, ACME_CONFIG, ACME_HEADER,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use assetsync_client::{AttributeRewrite, ItemValue, Pacer, RemoteItem};
use assetsync_reconcile::{
    format_tag, ActionExecutor, Archiver, FilePass, PassError, ProviderConfig,
};

fn acme_config() -> ProviderConfig {
    ProviderConfig::from_json(Path::new("config.json"), ACME_CONFIG).unwrap()
}

fn file_pass(source: FakeItemSource, mutator: &Arc<RecordingMutator>, archive: bool) -> FilePass {
    FilePass::new(
        Arc::new(source),
        ActionExecutor::new(mutator.clone(), Arc::new(Pacer::Unpaced)),
        Archiver::new(archive),
    )
}

#[tokio::test]
async fn test_full_pass() {
    let ws = Workspace::new();
    let file = ws.add_file(
        "acme",
        "assets.csv",
        &format!(
            "{ACME_HEADER}\nA-1;C-1;Laptop;1200\nA-2;C-1;Desk;300\nA-3;C-2;Chair;80\nbroken-row\n"
        ),
    );

    let remote = vec![
        tagged_item("10", &acme_key("A-1", "C-1")),
        name_tagged_item("11", &acme_key("A-2", "C-1")),
        RemoteItem::new("12").with_description("{id:zz99}"),
        RemoteItem::new("13").with_name("Hand-made entry"),
    ];
    let mutator = Arc::new(RecordingMutator::new());
    let pass = file_pass(FakeItemSource::with_items(remote), &mutator, true);

    let summary = pass.run("acme", &acme_config(), &file).await.unwrap();

    let c = summary.counts;
    assert_eq!(c.records_read, 3);
    assert_eq!(c.rows_skipped, 1);
    assert_eq!(c.matched, 2);
    assert_eq!(c.values_pushed, 2);
    assert_eq!(c.attributes_rewritten, 1);
    assert_eq!(c.retired, 1);
    assert_eq!(c.creation_candidates, 1);
    assert_eq!(c.unmanaged_items, 1);
    assert_eq!(c.failed_mutations, 0);

    assert_eq!(
        mutator.calls(),
        vec![
            MutatorCall::Push("10".into(), ItemValue::Scalar(json!(1200))),
            MutatorCall::Push("11".into(), ItemValue::Scalar(json!(300))),
            MutatorCall::Rewrite(
                "11".into(),
                AttributeRewrite {
                    description: format_tag(&acme_key("A-2", "C-1")),
                    name: "Desk".into(),
                }
            ),
            MutatorCall::Push("12".into(), ItemValue::Scalar(json!(0))),
        ]
    );

    assert!(!file.exists());
    let archived = summary.archived_to.unwrap();
    assert!(archived.exists());
    assert_eq!(ws.processed_files("acme"), vec![archived]);
}

#[tokio::test]
async fn test_listing_failure_aborts_pass_and_keeps_file() {
    let ws = Workspace::new();
    let file = ws.add_file("acme", "assets.csv", &format!("{ACME_HEADER}\nA-1;C-1;Laptop;1\n"));
    let mutator = Arc::new(RecordingMutator::new());
    let pass = file_pass(FakeItemSource::failing_listing(), &mutator, true);

    let err = pass.run("acme", &acme_config(), &file).await.unwrap_err();

    assert!(matches!(err, PassError::Fetch(_)));
    assert!(mutator.calls().is_empty());
    assert!(file.exists());
}

#[tokio::test]
async fn test_failed_portfolio_is_counted() {
    let ws = Workspace::new();
    let file = ws.add_file("acme", "assets.csv", &format!("{ACME_HEADER}\nA-1;C-1;Laptop;1\n"));
    let source = FakeItemSource::with_items(vec![tagged_item("10", &acme_key("A-1", "C-1"))])
        .with_failed_portfolio("77");
    let mutator = Arc::new(RecordingMutator::new());

    let summary = file_pass(source, &mutator, false)
        .run("acme", &acme_config(), &file)
        .await
        .unwrap();

    assert_eq!(summary.counts.failed_portfolios, 1);
    assert_eq!(summary.counts.values_pushed, 1);
    assert!(summary.archived_to.is_none());
    assert!(file.exists());
}

#[tokio::test]
async fn test_unreadable_file_is_parse_error() {
    let ws = Workspace::new();
    let missing = ws.data_dir().join("acme").join("missing.csv");
    let mutator = Arc::new(RecordingMutator::new());
    let pass = file_pass(FakeItemSource::with_items(Vec::new()), &mutator, true);

    let err = pass.run("acme", &acme_config(), &missing).await.unwrap_err();
    assert!(matches!(err, PassError::Parse(_)));
}

#[tokio::test]
async fn test_mutation_failures_do_not_fail_pass() {
    let ws = Workspace::new();
    let file = ws.add_file(
        "acme",
        "assets.csv",
        &format!("{ACME_HEADER}\nA-1;C-1;Laptop;1\nA-2;C-1;Desk;2\n"),
    );
    let remote = vec![
        tagged_item("10", &acme_key("A-1", "C-1")),
        tagged_item("11", &acme_key("A-2", "C-1")),
    ];
    let mutator = Arc::new(RecordingMutator::failing_for(&["10"]));

    let summary = file_pass(FakeItemSource::with_items(remote), &mutator, true)
        .run("acme", &acme_config(), &file)
        .await
        .unwrap();

    assert_eq!(summary.counts.failed_mutations, 1);
    assert_eq!(summary.counts.values_pushed, 1);
    assert_eq!(mutator.calls().len(), 2);
}

#[tokio::test]
async fn test_archive_failure_keeps_counts_of_issued_calls() {
    let ws = Workspace::new();
    let file = ws.add_file("acme", "assets.csv", &format!("{ACME_HEADER}\nA-1;C-1;Laptop;1\n"));
    // A plain file where the archive directory should go.
    std::fs::write(ws.data_dir().join("acme").join("processed"), b"").unwrap();
    let mutator = Arc::new(RecordingMutator::new());
    let source = FakeItemSource::with_items(vec![tagged_item("10", &acme_key("A-1", "C-1"))]);

    let summary = file_pass(source, &mutator, true)
        .run("acme", &acme_config(), &file)
        .await
        .unwrap();

    assert_eq!(mutator.calls().len(), 1);
    assert_eq!(summary.counts.values_pushed, 1);
    assert_eq!(summary.counts.archive_failures, 1);
    assert!(summary.archived_to.is_none());
    assert!(file.exists());
}
