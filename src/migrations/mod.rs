pub mod bundle;
pub mod procedures;
pub mod registry;
pub mod runner;
pub mod tracker;

pub use bundle::{MigrationBundle, UrlNormalizer};
pub use registry::{MigrationProcedure, MigrationRegistry};
pub use runner::{MigrationReport, MigrationRunner};
pub use tracker::{AppliedMigrations, InMemoryAppliedMigrations, KvAppliedMigrations};
