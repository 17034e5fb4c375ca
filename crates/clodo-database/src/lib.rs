//! Database Orchestrator (component J): per-environment migrations,
//! backups, and cleanup for the per-domain databases a deployment
//! provisions.

pub mod audit;
pub mod backup;
pub mod cleanup;
pub mod error;
pub mod naming;
pub mod orchestrator;

pub use backup::BackupManifest;
pub use cleanup::CleanupMode;
pub use error::DatabaseError;
pub use naming::database_name;
pub use orchestrator::{DatabaseOrchestrator, MigrationTarget};
