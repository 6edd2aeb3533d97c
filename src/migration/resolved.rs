use crate::db::CqlSession;
use crate::migration::{MigrationType, MigrationVersion};
use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Replays a resolved migration against a live session
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    async fn execute(&self, session: &dyn CqlSession) -> Result<()>;
}

/// A migration candidate discovered from source material
#[derive(Clone)]
pub struct ResolvedMigration {
    /// `None` only for code migrations that do not carry a version
    pub version: Option<MigrationVersion>,
    pub description: String,
    /// Script path relative to its location, or the code migration's name
    pub script: String,
    pub checksum: Option<i32>,
    pub migration_type: MigrationType,
    /// Where the migration was found, for diagnostics
    pub physical_location: String,
    pub executor: Arc<dyn MigrationExecutor>,
}

impl ResolvedMigration {
    /// Ordering used by the composite resolver: versioned first by version,
    /// unversioned after by description
    pub fn resolution_order(&self, other: &Self) -> Ordering {
        match (&self.version, &other.version) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.description.cmp(&other.description),
        }
    }

    pub fn version_label(&self) -> String {
        self.version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| self.description.clone())
    }
}

impl PartialEq for ResolvedMigration {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.description == other.description
            && self.script == other.script
            && self.checksum == other.checksum
            && self.migration_type == other.migration_type
            && self.physical_location == other.physical_location
    }
}

impl Eq for ResolvedMigration {}

impl fmt::Debug for ResolvedMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMigration")
            .field("version", &self.version)
            .field("description", &self.description)
            .field("script", &self.script)
            .field("checksum", &self.checksum)
            .field("migration_type", &self.migration_type)
            .field("physical_location", &self.physical_location)
            .finish_non_exhaustive()
    }
}
