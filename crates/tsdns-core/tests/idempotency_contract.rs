//! Contract Test: Idempotency
//!
//! Running the full sync twice with no inventory change must be a no-op the
//! second time.
//!
//! Constraints verified:
//! - Second apply run creates, updates and deletes nothing
//! - An inventory change between runs only touches the affected hostnames
//! - The folder is created once and reused

mod common;

use common::*;
use tempfile::TempDir;
use tsdns_core::{SyncMode, SyncRunner};

#[tokio::test]
async fn second_apply_run_changes_nothing() {
    let backups = TempDir::new().unwrap();
    let mut config = test_config(&["ts", "funny-name.ts.net"], false);
    config.backup.dir = backups.path().to_path_buf();

    let source = StaticInventorySource::new(
        vec![
            device("server1.funny-name.ts.net", "100.64.0.1"),
            device("laptop.funny-name.ts.net", "100.64.0.2"),
        ],
        vec![service("grafana", "100.100.0.5")],
    );
    let store = MockRecordStore::new();

    let runner = SyncRunner::new(&config, &source, &store);

    let first = runner.run(SyncMode::Apply).await.unwrap();
    assert_eq!(first.report.created, 6);
    assert_eq!(first.report.total_changes(), 6);
    assert_eq!(store.create_folder_calls(), 1);

    let calls_after_first = store.mutation_calls();

    let second = runner.run(SyncMode::Apply).await.unwrap();
    assert_eq!(second.report.created, 0);
    assert_eq!(second.report.updated, 0);
    assert_eq!(second.report.deleted, 0);
    assert_eq!(second.report.unchanged, 6);
    assert_eq!(
        store.mutation_calls(),
        calls_after_first,
        "second run must not mutate the store"
    );
    assert_eq!(store.create_folder_calls(), 1, "folder is reused");
    assert_eq!(second.folder, first.folder);
}

#[tokio::test]
async fn inventory_change_only_touches_affected_hostnames() {
    let backups = TempDir::new().unwrap();
    let mut config = test_config(&["ts"], true);
    config.backup.dir = backups.path().to_path_buf();

    let source = StaticInventorySource::new(
        vec![
            device("server1", "100.64.0.1"),
            device("server2", "100.64.0.2"),
        ],
        Vec::new(),
    );
    let store = MockRecordStore::new();
    let runner = SyncRunner::new(&config, &source, &store);

    runner.run(SyncMode::Apply).await.unwrap();

    // server1 moves, server2 disappears, server3 appears
    source.set_devices(vec![
        device("server1", "100.64.0.11"),
        device("server3", "100.64.0.3"),
    ]);

    let outcome = runner.run(SyncMode::Apply).await.unwrap();
    assert_eq!(outcome.report.updated, 2, "server1 and server1.ts");
    assert_eq!(outcome.report.deleted, 2, "server2 and server2.ts");
    assert_eq!(outcome.report.created, 2, "server3 and server3.ts");
    assert_eq!(outcome.report.unchanged, 0);

    assert_eq!(store.address_of("server1.ts").as_deref(), Some("100.64.0.11"));
    assert_eq!(store.address_of("server2.ts"), None);
    assert_eq!(store.address_of("server3").as_deref(), Some("100.64.0.3"));
}
