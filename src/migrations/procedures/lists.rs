use std::collections::HashSet;

use async_trait::async_trait;
use log::{debug, info};

use super::{
    CUSTOM_LISTS_TABLE, LIST_SUGGESTIONS_CACHE_KEY, LIST_SUGGESTIONS_LIMIT, MOBILE_LIST_NAME,
    PAGE_LIST_ENTRIES_TABLE, RESERVED_LIST_NAMES,
};
use crate::core::{MigrateError, Record, Result, Value};
use crate::migrations::bundle::MigrationBundle;
use crate::migrations::registry::MigrationProcedure;
use crate::storage::{ObjectFilter, ObjectUpdate};

/// Term search over list names needs a dedicated indexed field, so copy
/// each list's name into `searchableName`. Lists the application manages
/// itself are not meant to be found that way and keep the field unset.
pub struct BackfillSearchableListNames;

#[async_trait]
impl MigrationProcedure for BackfillSearchableListNames {
    fn id(&self) -> &'static str {
        "searchable-list-name"
    }

    fn description(&self) -> &'static str {
        "copy list names into the indexed searchableName field"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let everything = ObjectFilter::new();
        let lists = bundle
            .collections
            .find_all_objects(CUSTOM_LISTS_TABLE, &everything)
            .await?;

        let mut updated = 0;
        for list in &lists {
            let name = list.require_str("name")?;
            if RESERVED_LIST_NAMES.contains(&name) {
                continue;
            }

            let by_id = ObjectFilter::from([("id".to_string(), list.require("id")?.clone())]);
            let patch = ObjectUpdate::from([("searchableName".to_string(), Value::from(name))]);
            bundle
                .collections
                .update_objects(CUSTOM_LISTS_TABLE, &by_id, &patch)
                .await?;
            updated += 1;
        }

        debug!("searchable names backfilled: lists={}", updated);
        Ok(())
    }
}

/// List renames used to update the database but not the suggestion cache,
/// leaving the two out of sync. Rebuild the cache from the lists themselves.
pub struct ReseedListSuggestionCache;

#[async_trait]
impl MigrationProcedure for ReseedListSuggestionCache {
    fn id(&self) -> &'static str {
        "reseed-collections-suggestion-cache"
    }

    fn description(&self) -> &'static str {
        "rebuild the list suggestion cache from stored lists"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let lists = bundle.db.read_all(CUSTOM_LISTS_TABLE).await?;

        let mut names = Vec::new();
        for list in lists.iter().take(LIST_SUGGESTIONS_LIMIT) {
            names.push(list.require_str("name")?.to_string());
        }

        debug!("reseeding suggestion cache: names={}", names.len());
        bundle
            .kv
            .set(LIST_SUGGESTIONS_CACHE_KEY, serde_json::Value::from(names))
            .await
    }
}

/// Some installations ended up with two "Saved from Mobile" lists splitting
/// the saved pages between them. Keep whichever holds more entries (ties
/// keep the later one), move the other's entries over, and delete it.
///
/// More than two duplicates means the data is in a state this repair was
/// never written for, so it refuses to guess and leaves everything alone.
pub struct MergeDuplicateMobileLists;

#[async_trait]
impl MigrationProcedure for MergeDuplicateMobileLists {
    fn id(&self) -> &'static str {
        "unify-duped-mobile-lists"
    }

    fn description(&self) -> &'static str {
        "merge the duplicated mobile list pair into one"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let mobile_lists = bundle
            .db
            .scan_where(CUSTOM_LISTS_TABLE, &|list| {
                list.get_str("name") == Some(MOBILE_LIST_NAME)
            })
            .await?;

        if mobile_lists.len() < 2 {
            debug!("no duplicate mobile lists: found={}", mobile_lists.len());
            return Ok(());
        }
        if mobile_lists.len() > 2 {
            return Err(MigrateError::DuplicateCardinality {
                name: MOBILE_LIST_NAME.to_string(),
                count: mobile_lists.len(),
            });
        }

        let first_id = mobile_lists[0].require("id")?.clone();
        let second_id = mobile_lists[1].require("id")?.clone();
        let first_entries = self.entries_of(bundle, &first_id).await?;
        let second_entries = self.entries_of(bundle, &second_id).await?;

        // Ties keep the later list.
        let (keep_id, keep_entries, drop_id, drop_entries) =
            if first_entries.len() > second_entries.len() {
                (first_id, first_entries, second_id, second_entries)
            } else {
                (second_id, second_entries, first_id, first_entries)
            };

        // Every entry url must be readable before anything is rewritten.
        let mut kept_urls = HashSet::new();
        for entry in &keep_entries {
            kept_urls.insert(entry.require_str("pageUrl")?.to_string());
        }
        for entry in &drop_entries {
            entry.require_str("pageUrl")?;
        }

        info!(
            "merging duplicate mobile lists: keep='{}' drop='{}'",
            keep_id, drop_id
        );

        // Move entries the kept list does not have yet...
        let moved = bundle
            .db
            .modify_where(
                PAGE_LIST_ENTRIES_TABLE,
                &|entry| {
                    entry.get("listId") == Some(&drop_id)
                        && entry
                            .get_str("pageUrl")
                            .is_some_and(|url| !kept_urls.contains(url))
                },
                &|entry| {
                    entry.set("listId", keep_id.clone());
                    Ok(())
                },
            )
            .await?;

        // ...then drop the rest: the kept list already has those pages.
        let dropped = bundle
            .db
            .delete_where(PAGE_LIST_ENTRIES_TABLE, &|entry| {
                entry.get("listId") == Some(&drop_id)
            })
            .await?;
        bundle
            .db
            .delete_where(CUSTOM_LISTS_TABLE, &|list| list.get("id") == Some(&drop_id))
            .await?;

        debug!("mobile list merge done: moved={} dropped={}", moved, dropped);
        Ok(())
    }
}

impl MergeDuplicateMobileLists {
    async fn entries_of(&self, bundle: &MigrationBundle, list_id: &Value) -> Result<Vec<Record>> {
        bundle
            .db
            .scan_where(PAGE_LIST_ENTRIES_TABLE, &|entry| {
                entry.get("listId") == Some(list_id)
            })
            .await
    }
}
