use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use crate::core::Result;
use crate::storage::KeyValueArea;

/// The installation's record of completed migrations.
///
/// The set only grows: there is no unmark, and `mark_applied` must be
/// durable before it returns, otherwise a migration could run twice on data
/// it is not allowed to see twice.
#[async_trait]
pub trait AppliedMigrations: Send + Sync {
    /// Whether `id` has completed here. A query, never a side effect.
    async fn is_applied(&self, id: &str) -> Result<bool>;

    /// Record `id` as complete.
    async fn mark_applied(&self, id: &str) -> Result<()>;
}

/// Applied set kept in a [`KeyValueArea`], one entry per migration id under
/// the id itself. This is the layout existing installations already carry,
/// so upgraded deployments keep their history.
pub struct KvAppliedMigrations {
    kv: Arc<dyn KeyValueArea>,
}

impl KvAppliedMigrations {
    pub fn new(kv: Arc<dyn KeyValueArea>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl AppliedMigrations for KvAppliedMigrations {
    async fn is_applied(&self, id: &str) -> Result<bool> {
        let value = self.kv.get(id).await?;
        Ok(value.is_some_and(|v| stored_flag_is_set(&v)))
    }

    async fn mark_applied(&self, id: &str) -> Result<()> {
        self.kv.set(id, serde_json::Value::Bool(true)).await?;
        debug!("marked migration applied: id='{}'", id);
        Ok(())
    }
}

/// Older versions stored the flag as whatever the platform serialized, not
/// always a boolean, so read it with the host's truthiness rules.
fn stored_flag_is_set(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Applied set held in memory, for tests and for hosts that persist the set
/// themselves.
pub struct InMemoryAppliedMigrations {
    applied: RwLock<HashSet<String>>,
}

impl InMemoryAppliedMigrations {
    pub fn new() -> Self {
        Self {
            applied: RwLock::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryAppliedMigrations {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppliedMigrations for InMemoryAppliedMigrations {
    async fn is_applied(&self, id: &str) -> Result<bool> {
        Ok(self.applied.read().await.contains(id))
    }

    async fn mark_applied(&self, id: &str) -> Result<()> {
        self.applied.write().await.insert(id.to_string());
        Ok(())
    }
}
