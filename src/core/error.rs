use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Store error: {0}")]
    TransientStore(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Record shape error: {0}")]
    DataShape(String),

    #[error("Found {count} lists named '{name}' where at most 2 were expected")]
    DuplicateCardinality { name: String, count: usize },

    #[error("Migration '{0}' is already registered")]
    DuplicateMigrationId(String),

    #[error("Migration '{id}' failed: {source}")]
    MigrationFailed {
        id: String,
        #[source]
        source: Box<MigrateError>,
    },
}

pub type Result<T> = std::result::Result<T, MigrateError>;

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        Self::TransientStore(err.to_string())
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        Self::TransientStore(err.to_string())
    }
}
