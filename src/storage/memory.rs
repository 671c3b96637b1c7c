use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::handles::{CollectionStore, ObjectFilter, ObjectUpdate, RowStore};
use super::table::Table;
use crate::core::{MigrateError, Record, Result};

/// In-memory store: named tables with individual locks.
///
/// Implements both store views, since the row handle and the collection
/// handle an application passes in are two doors into the same database.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Register `name`; a table that already exists is left as it is.
    pub async fn create_table(&self, name: &str) {
        let mut tables = self.tables.write().await;
        tables
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Table::new())));
    }

    pub async fn insert(&self, table: &str, record: Record) -> Result<()> {
        let handle = self.table_handle(table).await?;
        let mut guard = handle.write().await;
        guard.insert(record);
        Ok(())
    }

    /// Handle for concurrent access to one table.
    async fn table_handle(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| MigrateError::TableNotFound(name.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(record: &Record, filter: &ObjectFilter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn read_all(&self, table: &str) -> Result<Vec<Record>> {
        let handle = self.table_handle(table).await?;
        let guard = handle.read().await;
        Ok(guard.scan())
    }

    async fn scan_where(
        &self,
        table: &str,
        filter: &(dyn for<'a> Fn(&'a Record) -> bool + Send + Sync),
    ) -> Result<Vec<Record>> {
        let handle = self.table_handle(table).await?;
        let guard = handle.read().await;
        Ok(guard.scan_where(filter))
    }

    async fn modify_where(
        &self,
        table: &str,
        filter: &(dyn for<'a> Fn(&'a Record) -> bool + Send + Sync),
        mutate: &(dyn for<'a> Fn(&'a mut Record) -> Result<()> + Send + Sync),
    ) -> Result<usize> {
        let handle = self.table_handle(table).await?;
        let mut guard = handle.write().await;
        guard.modify_where(filter, mutate)
    }

    async fn delete_where(
        &self,
        table: &str,
        filter: &(dyn for<'a> Fn(&'a Record) -> bool + Send + Sync),
    ) -> Result<usize> {
        let handle = self.table_handle(table).await?;
        let mut guard = handle.write().await;
        Ok(guard.delete_where(filter))
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn find_all_objects(
        &self,
        collection: &str,
        filter: &ObjectFilter,
    ) -> Result<Vec<Record>> {
        let handle = self.table_handle(collection).await?;
        let guard = handle.read().await;
        Ok(guard.scan_where(|record| matches_filter(record, filter)))
    }

    async fn update_objects(
        &self,
        collection: &str,
        filter: &ObjectFilter,
        update: &ObjectUpdate,
    ) -> Result<usize> {
        let handle = self.table_handle(collection).await?;
        let mut guard = handle.write().await;
        guard.modify_where(
            |record| matches_filter(record, filter),
            |record| {
                for (field, value) in update {
                    record.set(field, value.clone());
                }
                Ok(())
            },
        )
    }
}
