//! Key-value persistence for the host's small-object area.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::Result;

/// Last-write-wins key-value area, as the host exposes it to extensions.
///
/// `set` replaces whole values and there is no transaction across keys, so
/// callers must tolerate any interleaving of single-key writes.
#[async_trait]
pub trait KeyValueArea: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

// ============================================================================
// In-memory area
// ============================================================================

pub struct MemoryKvArea {
    entries: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryKvArea {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryKvArea {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueArea for MemoryKvArea {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// File-backed area
// ============================================================================

/// On-disk document format of [`FileKvArea`].
#[derive(Debug, Serialize, Deserialize)]
struct KvDocument {
    version: u32,
    entries: BTreeMap<String, serde_json::Value>,
}

/// File-backed area. Every `set` rewrites the document through a temp file,
/// flush, fsync and rename, so a crash leaves either the old or the new
/// state on disk, never a torn one.
pub struct FileKvArea {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl FileKvArea {
    /// Open `path`, loading the existing document if one is there.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let mut data = String::new();
            File::open(&path)?.read_to_string(&mut data)?;
            let document: KvDocument = serde_json::from_str(&data)?;
            document.entries
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn write_document(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = KvDocument {
            version: 1,
            entries: entries.clone(),
        };

        let temp_path = self.path.with_extension("tmp");
        let temp_file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer(&mut writer, &document)?;
        std::io::Write::flush(&mut writer)?;
        writer.get_mut().sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueArea for FileKvArea {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.write_document(&entries)
    }
}
