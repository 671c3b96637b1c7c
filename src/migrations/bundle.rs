use std::sync::Arc;

use crate::storage::{CollectionStore, KeyValueArea, RowStore};

/// Canonicalizes a URL for lookups. Must be pure, deterministic and happy
/// to receive already-normalized input; the rules belong to the host.
pub type UrlNormalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Everything a migration may touch, injected by the application at
/// startup. All handles are shared, so the bundle clones cheaply.
///
/// `db` and `collections` are usually two doors into the same database:
/// the raw row surface for predicate scans and bulk edits, and the
/// object surface the rest of the application talks to.
#[derive(Clone)]
pub struct MigrationBundle {
    pub db: Arc<dyn RowStore>,
    pub collections: Arc<dyn CollectionStore>,
    pub normalize_url: UrlNormalizer,
    pub kv: Arc<dyn KeyValueArea>,
}

impl MigrationBundle {
    pub fn new(
        db: Arc<dyn RowStore>,
        collections: Arc<dyn CollectionStore>,
        normalize_url: UrlNormalizer,
        kv: Arc<dyn KeyValueArea>,
    ) -> Self {
        Self {
            db,
            collections,
            normalize_url,
            kv,
        }
    }

    /// Normalized form of `url` under the host's canonicalization rules.
    pub fn normalize(&self, url: &str) -> String {
        self.normalize_url.as_ref()(url)
    }
}
