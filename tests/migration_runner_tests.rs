use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use datafix::migrations::procedures::{
    ANNOTATIONS_TABLE, CUSTOM_LISTS_TABLE, PAGE_LIST_ENTRIES_TABLE, SYNC_LOG_TABLE, TAGS_TABLE,
    VISITS_TABLE,
};
use datafix::storage::{FileKvArea, MemoryKvArea, MemoryStore};
use datafix::{
    AppliedMigrations, InMemoryAppliedMigrations, KvAppliedMigrations, MigrateError,
    MigrationBundle, MigrationProcedure, MigrationRegistry, MigrationRunner, Result,
};

type ExecutionLog = Arc<Mutex<Vec<&'static str>>>;

/// Pushes its id to a shared log on every run and fails the first
/// `failures` runs, so tests can script any pass outcome.
struct ScriptedMigration {
    id: &'static str,
    failures_left: AtomicUsize,
    log: ExecutionLog,
}

impl ScriptedMigration {
    fn new(id: &'static str, failures: usize, log: &ExecutionLog) -> Arc<Self> {
        Arc::new(Self {
            id,
            failures_left: AtomicUsize::new(failures),
            log: log.clone(),
        })
    }
}

#[async_trait]
impl MigrationProcedure for ScriptedMigration {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        "scripted test migration"
    }

    async fn run(&self, _bundle: &MigrationBundle) -> Result<()> {
        self.log.lock().expect("log lock").push(self.id);
        let failures = self.failures_left.load(Ordering::SeqCst);
        if failures > 0 {
            self.failures_left.store(failures - 1, Ordering::SeqCst);
            return Err(MigrateError::TransientStore("injected failure".into()));
        }
        Ok(())
    }
}

/// Delegates to an in-memory set but refuses to record one chosen id.
struct FailingMarkTracker {
    inner: InMemoryAppliedMigrations,
    refuse: &'static str,
}

#[async_trait]
impl AppliedMigrations for FailingMarkTracker {
    async fn is_applied(&self, id: &str) -> Result<bool> {
        self.inner.is_applied(id).await
    }

    async fn mark_applied(&self, id: &str) -> Result<()> {
        if id == self.refuse {
            return Err(MigrateError::TransientStore(
                "tracker write refused".into(),
            ));
        }
        self.inner.mark_applied(id).await
    }
}

fn empty_bundle() -> MigrationBundle {
    let store = Arc::new(MemoryStore::new());
    MigrationBundle::new(
        store.clone(),
        store,
        Arc::new(|url: &str| url.to_string()),
        Arc::new(MemoryKvArea::new()),
    )
}

fn scripted_registry(
    log: &ExecutionLog,
    migrations: &[(&'static str, usize)],
) -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    for &(id, failures) in migrations {
        registry
            .register(ScriptedMigration::new(id, failures, log))
            .expect("distinct test ids");
    }
    registry
}

fn new_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn migrations_run_in_registration_order() {
    let log = new_log();
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 0), ("fix-c", 0)]);
    let tracker = Arc::new(InMemoryAppliedMigrations::new());
    let runner = MigrationRunner::new(registry, tracker.clone(), empty_bundle());

    let report = runner.run_pending().await.expect("pass");

    assert_eq!(report.applied, vec!["fix-a", "fix-b", "fix-c"]);
    assert_eq!(report.skipped, 0);
    assert_eq!(*log.lock().expect("log"), vec!["fix-a", "fix-b", "fix-c"]);
    assert!(tracker.is_applied("fix-b").await.expect("query"));
}

#[tokio::test]
async fn applied_migrations_are_skipped() {
    let log = new_log();
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 0), ("fix-c", 0)]);
    let tracker = Arc::new(InMemoryAppliedMigrations::new());
    tracker.mark_applied("fix-b").await.expect("pre-mark");
    let runner = MigrationRunner::new(registry, tracker, empty_bundle());

    let report = runner.run_pending().await.expect("pass");

    assert_eq!(report.applied, vec!["fix-a", "fix-c"]);
    assert_eq!(report.skipped, 1);
    assert_eq!(*log.lock().expect("log"), vec!["fix-a", "fix-c"]);
}

#[tokio::test]
async fn failure_stops_the_pass_and_names_the_migration() {
    let log = new_log();
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 1), ("fix-c", 0)]);
    let tracker = Arc::new(InMemoryAppliedMigrations::new());
    let runner = MigrationRunner::new(registry, tracker.clone(), empty_bundle());

    let err = runner.run_pending().await.expect_err("second one fails");
    match err {
        MigrateError::MigrationFailed { id, source } => {
            assert_eq!(id, "fix-b");
            assert!(matches!(*source, MigrateError::TransientStore(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // the first completed and was recorded, everything after stays pending
    assert_eq!(*log.lock().expect("log"), vec!["fix-a", "fix-b"]);
    assert!(tracker.is_applied("fix-a").await.expect("query"));
    assert!(!tracker.is_applied("fix-b").await.expect("query"));
    assert!(!tracker.is_applied("fix-c").await.expect("query"));
}

#[tokio::test]
async fn failed_migration_retries_on_the_next_pass() {
    let log = new_log();
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 1), ("fix-c", 0)]);
    let tracker = Arc::new(InMemoryAppliedMigrations::new());
    let runner = MigrationRunner::new(registry, tracker, empty_bundle());

    runner.run_pending().await.expect_err("first pass fails");
    let report = runner.run_pending().await.expect("second pass");

    assert_eq!(report.applied, vec!["fix-b", "fix-c"]);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        *log.lock().expect("log"),
        vec!["fix-a", "fix-b", "fix-b", "fix-c"]
    );
}

#[tokio::test]
async fn tracker_write_failure_fails_that_migration() {
    let log = new_log();
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 0), ("fix-c", 0)]);
    let tracker = Arc::new(FailingMarkTracker {
        inner: InMemoryAppliedMigrations::new(),
        refuse: "fix-b",
    });
    let runner = MigrationRunner::new(registry, tracker.clone(), empty_bundle());

    let err = runner.run_pending().await.expect_err("mark refused");
    match err {
        MigrateError::MigrationFailed { id, .. } => assert_eq!(id, "fix-b"),
        other => panic!("unexpected error: {other:?}"),
    }

    // the procedure itself ran; only the record is missing
    assert_eq!(*log.lock().expect("log"), vec!["fix-a", "fix-b"]);
    assert!(tracker.is_applied("fix-a").await.expect("query"));
    assert!(!tracker.is_applied("fix-b").await.expect("query"));
}

#[tokio::test]
async fn pending_lists_unapplied_ids_in_order() {
    let log = new_log();
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 0), ("fix-c", 0)]);
    let tracker = Arc::new(InMemoryAppliedMigrations::new());
    tracker.mark_applied("fix-b").await.expect("pre-mark");
    let runner = MigrationRunner::new(registry, tracker, empty_bundle());

    assert_eq!(runner.pending().await.expect("list"), vec!["fix-a", "fix-c"]);
    assert!(log.lock().expect("log").is_empty());

    runner.run_pending().await.expect("pass");
    assert!(runner.pending().await.expect("list").is_empty());
}

#[tokio::test]
async fn empty_registry_pass_is_clean() {
    let runner = MigrationRunner::new(
        MigrationRegistry::new(),
        Arc::new(InMemoryAppliedMigrations::new()),
        empty_bundle(),
    );

    let report = runner.run_pending().await.expect("pass");
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn applied_set_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("settings.json");
    let log = new_log();

    {
        let kv = Arc::new(FileKvArea::open(&path).expect("open fresh"));
        let tracker = Arc::new(KvAppliedMigrations::new(kv));
        let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 0)]);
        let runner = MigrationRunner::new(registry, tracker, empty_bundle());
        let report = runner.run_pending().await.expect("first pass");
        assert_eq!(report.applied.len(), 2);
    }

    // a fresh process over the same file sees the history
    let kv = Arc::new(FileKvArea::open(&path).expect("reopen"));
    let tracker = Arc::new(KvAppliedMigrations::new(kv));
    let registry = scripted_registry(&log, &[("fix-a", 0), ("fix-b", 0)]);
    let runner = MigrationRunner::new(registry, tracker, empty_bundle());

    let report = runner.run_pending().await.expect("second pass");
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, 2);
    assert_eq!(*log.lock().expect("log"), vec!["fix-a", "fix-b"]);
}

#[tokio::test]
async fn builtin_set_runs_clean_on_an_empty_store() {
    let store = Arc::new(MemoryStore::new());
    for table in [
        CUSTOM_LISTS_TABLE,
        PAGE_LIST_ENTRIES_TABLE,
        ANNOTATIONS_TABLE,
        SYNC_LOG_TABLE,
        TAGS_TABLE,
        VISITS_TABLE,
    ] {
        store.create_table(table).await;
    }
    let bundle = MigrationBundle::new(
        store.clone(),
        store,
        Arc::new(|url: &str| url.to_string()),
        Arc::new(MemoryKvArea::new()),
    );
    let tracker = Arc::new(InMemoryAppliedMigrations::new());

    let runner = MigrationRunner::with_builtin_migrations(tracker.clone(), bundle.clone());
    let report = runner.run_pending().await.expect("first pass");
    assert_eq!(report.applied.len(), 8);
    assert_eq!(report.skipped, 0);

    let rerun = MigrationRunner::with_builtin_migrations(tracker, bundle);
    let report = rerun.run_pending().await.expect("second pass");
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, 8);
}
