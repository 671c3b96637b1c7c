pub mod handles;
pub mod kv;
pub mod memory;
pub mod table;

pub use handles::{CollectionStore, ObjectFilter, ObjectUpdate, RowStore};
pub use kv::{FileKvArea, KeyValueArea, MemoryKvArea};
pub use memory::MemoryStore;
pub use table::Table;
