use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::core::{Record, Result, Value};

/// Conjunction of field equalities: a record matches when every named field
/// is present and holds exactly the given value. Empty matches everything.
pub type ObjectFilter = BTreeMap<String, Value>;

/// Patch applied to matching records: each named field is set to the given
/// value, other fields are left alone.
pub type ObjectUpdate = BTreeMap<String, Value>;

/// Row-level view of the store: scan, mutate and delete by predicate.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All rows of `table` in stable scan order.
    async fn read_all(&self, table: &str) -> Result<Vec<Record>>;

    /// Rows of `table` matching `filter`, in stable scan order.
    async fn scan_where(
        &self,
        table: &str,
        filter: &(dyn for<'a> Fn(&'a Record) -> bool + Send + Sync),
    ) -> Result<Vec<Record>>;

    /// Apply `mutate` to every row matching `filter`, returning how many
    /// rows it touched. A mutation error aborts the scan; rows already
    /// mutated keep their new state, so mutations must be safe to re-apply.
    async fn modify_where(
        &self,
        table: &str,
        filter: &(dyn for<'a> Fn(&'a Record) -> bool + Send + Sync),
        mutate: &(dyn for<'a> Fn(&'a mut Record) -> Result<()> + Send + Sync),
    ) -> Result<usize>;

    /// Delete every row matching `filter`, returning how many went away.
    async fn delete_where(
        &self,
        table: &str,
        filter: &(dyn for<'a> Fn(&'a Record) -> bool + Send + Sync),
    ) -> Result<usize>;
}

/// Object-level view of the store, the shape the higher storage layer
/// exposes: equality filters in, field patches out.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn find_all_objects(
        &self,
        collection: &str,
        filter: &ObjectFilter,
    ) -> Result<Vec<Record>>;

    /// Patch every object matching `filter`, returning how many changed.
    async fn update_objects(
        &self,
        collection: &str,
        filter: &ObjectFilter,
        update: &ObjectUpdate,
    ) -> Result<usize>;
}
