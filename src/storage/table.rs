use std::collections::BTreeMap;

use crate::core::{Record, Result};

/// Rows of one table, keyed by an internal id so scans are deterministic.
///
/// Migrations care about field contents, not storage keys, so the id never
/// leaves this module; it only fixes the scan order.
#[derive(Debug, Clone)]
pub struct Table {
    rows: BTreeMap<i64, Record>,
    next_row_id: i64,
}

impl Table {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_row_id: 0,
        }
    }

    pub fn insert(&mut self, record: Record) {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(id, record);
    }

    /// All rows in scan order.
    pub fn scan(&self) -> Vec<Record> {
        self.rows.values().cloned().collect()
    }

    /// Rows matching `filter`, in scan order.
    pub fn scan_where<F>(&self, filter: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        self.rows
            .values()
            .filter(|record| filter(record))
            .cloned()
            .collect()
    }

    /// Apply `mutate` to every row matching `filter`, returning how many
    /// rows it touched. A mutation error stops the scan; rows already
    /// mutated keep their new state.
    pub fn modify_where<F, M>(&mut self, filter: F, mutate: M) -> Result<usize>
    where
        F: Fn(&Record) -> bool,
        M: Fn(&mut Record) -> Result<()>,
    {
        let mut touched = 0;
        for record in self.rows.values_mut() {
            if filter(record) {
                mutate(record)?;
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Delete every row matching `filter`, returning how many went away.
    pub fn delete_where<F>(&mut self, filter: F) -> usize
    where
        F: Fn(&Record) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|_, record| !filter(record));
        before - self.rows.len()
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MigrateError;

    fn table_with_urls(urls: &[&str]) -> Table {
        let mut table = Table::new();
        for url in urls {
            table.insert(Record::new().with("url", *url));
        }
        table
    }

    #[test]
    fn test_scan_keeps_insertion_order() {
        let table = table_with_urls(&["a", "b", "c"]);
        let urls: Vec<_> = table
            .scan()
            .iter()
            .map(|r| r.get_str("url").expect("fixture url").to_string())
            .collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delete_where_reports_count() {
        let mut table = table_with_urls(&["", "keep", ""]);
        let deleted = table.delete_where(|r| r.get_str("url") == Some(""));
        assert_eq!(deleted, 2);
        assert_eq!(table.scan().len(), 1);
    }

    #[test]
    fn test_modify_where_stops_on_error() {
        let mut table = Table::new();
        table.insert(Record::new().with("n", 1i64));
        table.insert(Record::new()); // no 'n' field
        table.insert(Record::new().with("n", 3i64));

        let result = table.modify_where(
            |_| true,
            |record| {
                record.require("n")?;
                record.set("seen", true);
                Ok(())
            },
        );

        assert!(matches!(result, Err(MigrateError::DataShape(_))));
        // first row was already mutated when the scan stopped
        let rows = table.scan();
        assert!(rows[0].has("seen"));
        assert!(!rows[2].has("seen"));
    }
}
