use async_trait::async_trait;
use log::debug;

use super::{ANNOTATIONS_TABLE, PAGE_LIST_ENTRIES_TABLE, TAGS_TABLE, VISITS_TABLE};
use crate::core::{MigrateError, Result, Value};
use crate::migrations::bundle::MigrationBundle;
use crate::migrations::registry::MigrationProcedure;

/// A mobile share flow could create page metadata with an empty URL in the
/// field everything joins on. Those rows associate with nothing; delete
/// them wherever they landed.
pub struct RemoveEmptyUrlRows;

#[async_trait]
impl MigrationProcedure for RemoveEmptyUrlRows {
    fn id(&self) -> &'static str {
        "remove-empty-url"
    }

    fn description(&self) -> &'static str {
        "delete rows whose page URL is the empty string"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let mut removed = 0;
        for table in [TAGS_TABLE, VISITS_TABLE] {
            removed += bundle
                .db
                .delete_where(table, &|row| row.get_str("url") == Some(""))
                .await?;
        }
        for table in [ANNOTATIONS_TABLE, PAGE_LIST_ENTRIES_TABLE] {
            removed += bundle
                .db
                .delete_where(table, &|row| row.get_str("pageUrl") == Some(""))
                .await?;
        }

        debug!("empty-url rows removed: rows={}", removed);
        Ok(())
    }
}

/// A bug stored the normalized URL in list entries' `fullUrl`, so the field
/// no longer loads as an address. Prepend a scheme to every value that
/// lacks one; entries with no value at all are left for other repairs.
pub struct RepairListEntryFullUrls;

#[async_trait]
impl MigrationProcedure for RepairListEntryFullUrls {
    fn id(&self) -> &'static str {
        "denormalize-list-entry-full-urls"
    }

    fn description(&self) -> &'static str {
        "prepend the missing scheme to list entry full URLs"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let changed = bundle
            .db
            .modify_where(
                PAGE_LIST_ENTRIES_TABLE,
                &|_| true,
                &|entry| {
                    let repaired = match entry.get("fullUrl") {
                        None => None,
                        Some(Value::Text(url)) => {
                            if url.is_empty() || url.starts_with("http") {
                                None
                            } else {
                                Some(format!("http://{}", url))
                            }
                        }
                        // null and other falsy shapes stay untouched
                        Some(value) if !value.as_bool() => None,
                        Some(value) => {
                            return Err(MigrateError::DataShape(format!(
                                "list entry fullUrl must be text, found {}",
                                value.type_name()
                            )));
                        }
                    };

                    if let Some(url) = repaired {
                        entry.set("fullUrl", url);
                    }
                    Ok(())
                },
            )
            .await?;

        debug!("list entry full URLs scanned: rows={}", changed);
        Ok(())
    }
}
