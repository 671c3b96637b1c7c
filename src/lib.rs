//! One-time data migrations for a client-resident structured store.
//!
//! Installations accumulate records written by older, sometimes buggy,
//! versions of an application: derived fields that were never filled,
//! duplicated rows, malformed values. Each repair here is a named,
//! idempotent [`MigrationProcedure`]; a [`MigrationRunner`] executes the
//! ones an installation has not seen yet, in registration order, and
//! records each completion so it never runs twice.
//!
//! The store itself stays behind the [`storage::RowStore`] and
//! [`storage::CollectionStore`] seams, so the runner works against whatever
//! engine the application embeds.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use datafix::storage::{FileKvArea, MemoryStore};
//! use datafix::{KvAppliedMigrations, MigrationBundle, MigrationRunner};
//!
//! # async fn run_at_startup() -> datafix::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let kv = Arc::new(FileKvArea::open("settings.json")?);
//!
//! let bundle = MigrationBundle::new(
//!     store.clone(),
//!     store,
//!     Arc::new(|url: &str| url.trim_start_matches("http://").to_string()),
//!     kv.clone(),
//! );
//! let tracker = Arc::new(KvAppliedMigrations::new(kv));
//!
//! let report = MigrationRunner::with_builtin_migrations(tracker, bundle)
//!     .run_pending()
//!     .await?;
//! log::info!("migrations applied: count={}", report.applied.len());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod migrations;
pub mod storage;

pub use crate::core::{MigrateError, Record, Result, Value};
pub use crate::migrations::{
    AppliedMigrations, InMemoryAppliedMigrations, KvAppliedMigrations, MigrationBundle,
    MigrationProcedure, MigrationRegistry, MigrationReport, MigrationRunner, UrlNormalizer,
};
pub use crate::storage::{
    CollectionStore, FileKvArea, KeyValueArea, MemoryKvArea, MemoryStore, ObjectFilter,
    ObjectUpdate, RowStore,
};
