pub mod applied;
pub mod naming;
pub mod resolved;
pub mod types;
pub mod version;

pub use applied::{AppliedMigration, abbreviate_description};
pub use naming::{MigrationNaming, extract_version_and_description};
pub use resolved::{MigrationExecutor, ResolvedMigration};
pub use types::{MigrationState, MigrationType};
pub use version::MigrationVersion;
