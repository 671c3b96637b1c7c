use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::bundle::MigrationBundle;
use crate::core::{MigrateError, Result};

/// One hand-written repair of previously persisted data.
///
/// Procedures must be safe to run again on data they already fixed: the
/// runner records completion only after `run` returns, so a crash between
/// the two replays the procedure on the next pass.
#[async_trait]
pub trait MigrationProcedure: Send + Sync {
    /// Stable identifier, stored in the applied set. Never reuse one for
    /// different logic; installations remember it forever.
    fn id(&self) -> &'static str;

    /// One-line story of what the procedure repairs.
    fn description(&self) -> &'static str;

    async fn run(&self, bundle: &MigrationBundle) -> Result<()>;
}

/// Ordered set of procedures. Registration order is execution order and is
/// never re-sorted; append new migrations at the end.
pub struct MigrationRegistry {
    procedures: Vec<Arc<dyn MigrationProcedure>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self {
            procedures: Vec::new(),
        }
    }

    /// All shipped migrations, in the order installations have always run
    /// them.
    pub fn with_builtin_migrations() -> Self {
        use super::procedures::*;

        let mut registry = Self::new();
        registry.procedures.push(Arc::new(BackfillSearchableListNames));
        registry.procedures.push(Arc::new(FillEmptySyncLogFields));
        registry.procedures.push(Arc::new(ReseedListSuggestionCache));
        registry.procedures.push(Arc::new(BackfillAnnotationPageUrls));
        registry.procedures.push(Arc::new(BackfillAnnotationLastEdited));
        registry.procedures.push(Arc::new(MergeDuplicateMobileLists));
        registry.procedures.push(Arc::new(RemoveEmptyUrlRows));
        registry.procedures.push(Arc::new(RepairListEntryFullUrls));
        registry
    }

    /// Append `procedure`. Ids must be unique within a registry.
    pub fn register(&mut self, procedure: Arc<dyn MigrationProcedure>) -> Result<()> {
        let id = procedure.id();
        if self.procedures.iter().any(|existing| existing.id() == id) {
            return Err(MigrateError::DuplicateMigrationId(id.to_string()));
        }
        debug!("registered migration: id='{}'", id);
        self.procedures.push(procedure);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MigrationProcedure> {
        self.procedures.iter().map(Arc::as_ref)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.procedures.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::with_builtin_migrations()
    }
}
