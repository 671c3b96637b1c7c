//! The shipped migrations, one per data bug an installation may carry.
//!
//! Ids, table names and cache keys are persisted-format constants: existing
//! installations already hold them, so they keep the original spellings no
//! matter what the code around them is renamed to.

pub mod annotations;
pub mod cleanup;
pub mod lists;
pub mod sync_log;

pub use annotations::{BackfillAnnotationLastEdited, BackfillAnnotationPageUrls};
pub use cleanup::{RemoveEmptyUrlRows, RepairListEntryFullUrls};
pub use lists::{BackfillSearchableListNames, MergeDuplicateMobileLists, ReseedListSuggestionCache};
pub use sync_log::FillEmptySyncLogFields;

pub const CUSTOM_LISTS_TABLE: &str = "customLists";
pub const PAGE_LIST_ENTRIES_TABLE: &str = "pageListEntries";
pub const ANNOTATIONS_TABLE: &str = "annotations";
pub const SYNC_LOG_TABLE: &str = "clientSyncLogEntry";
pub const TAGS_TABLE: &str = "tags";
pub const VISITS_TABLE: &str = "visits";

/// List names the application reserves for lists it manages itself.
pub const MOBILE_LIST_NAME: &str = "Saved from Mobile";
pub const INBOX_LIST_NAME: &str = "Inbox";
pub const RESERVED_LIST_NAMES: [&str; 2] = [MOBILE_LIST_NAME, INBOX_LIST_NAME];

/// Key-value entry holding the list-name suggestion cache.
pub const LIST_SUGGESTIONS_CACHE_KEY: &str = "custom-lists_suggestions";
/// The suggestion cache holds at most this many names.
pub const LIST_SUGGESTIONS_LIMIT: usize = 10;
