use std::sync::Arc;

use log::{debug, error, info};

use super::bundle::MigrationBundle;
use super::registry::MigrationRegistry;
use super::tracker::AppliedMigrations;
use crate::core::{MigrateError, Result};

/// What one pass did: which migrations ran to completion, in order, and how
/// many were skipped as already applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: usize,
}

/// Runs pending migrations at startup.
///
/// The pass is sequential and forward-only: procedures execute in
/// registration order, each completion is recorded before the next one
/// starts, and the first failure stops everything after it. Later
/// migrations stay pending and are re-evaluated from the top on the next
/// pass, which is why every procedure must be a no-op on data it already
/// fixed.
pub struct MigrationRunner {
    registry: MigrationRegistry,
    tracker: Arc<dyn AppliedMigrations>,
    bundle: MigrationBundle,
}

impl MigrationRunner {
    pub fn new(
        registry: MigrationRegistry,
        tracker: Arc<dyn AppliedMigrations>,
        bundle: MigrationBundle,
    ) -> Self {
        Self {
            registry,
            tracker,
            bundle,
        }
    }

    /// Runner over the shipped migration set.
    pub fn with_builtin_migrations(
        tracker: Arc<dyn AppliedMigrations>,
        bundle: MigrationBundle,
    ) -> Self {
        Self::new(MigrationRegistry::with_builtin_migrations(), tracker, bundle)
    }

    /// Ids that would run right now, in execution order. Runs nothing.
    pub async fn pending(&self) -> Result<Vec<&'static str>> {
        let mut pending = Vec::new();
        for procedure in self.registry.iter() {
            if !self.tracker.is_applied(procedure.id()).await? {
                pending.push(procedure.id());
            }
        }
        Ok(pending)
    }

    /// Run every unapplied migration, stopping at the first failure.
    ///
    /// A failure is wrapped in [`MigrateError::MigrationFailed`] naming the
    /// migration, so the caller can log which repair is stuck and continue
    /// startup in a partially migrated state.
    pub async fn run_pending(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for procedure in self.registry.iter() {
            let id = procedure.id();

            if self.tracker.is_applied(id).await? {
                debug!("migration already applied, skipping: id='{}'", id);
                report.skipped += 1;
                continue;
            }

            info!("running migration: id='{}' ({})", id, procedure.description());
            if let Err(cause) = procedure.run(&self.bundle).await {
                error!("migration failed: id='{}' cause='{}'", id, cause);
                return Err(MigrateError::MigrationFailed {
                    id: id.to_string(),
                    source: Box::new(cause),
                });
            }

            // The effect is in; if recording it fails the next pass will
            // re-run the procedure, which must tolerate that.
            if let Err(cause) = self.tracker.mark_applied(id).await {
                error!("failed to record migration: id='{}' cause='{}'", id, cause);
                return Err(MigrateError::MigrationFailed {
                    id: id.to_string(),
                    source: Box::new(cause),
                });
            }

            info!("migration complete: id='{}'", id);
            report.applied.push(id.to_string());
        }

        Ok(report)
    }
}
