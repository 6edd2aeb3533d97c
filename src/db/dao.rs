use crate::migration::{AppliedMigration, MigrationType, MigrationVersion};
use anyhow::Result;
use async_trait::async_trait;

/// Suffix of the companion table holding the installed-rank counter
pub const COUNTS_TABLE_SUFFIX: &str = "_counts";

/// Name of the counter row tracking the next installed rank
pub const INSTALLED_RANK_COUNTER: &str = "installed_rank";

/// Read/append access to the applied-migration ledger.
///
/// Implementations must hand out strictly increasing installed ranks even when
/// several processes write concurrently; the CQL implementation relies on a
/// counter table for this.
#[async_trait]
pub trait SchemaVersionDao: Send + Sync {
    /// Unqualified ledger table name, including any configured prefix
    fn table_name(&self) -> &str;

    fn keyspace(&self) -> &str;

    async fn tables_exist(&self) -> Result<bool>;

    async fn create_tables_if_not_exist(&self) -> Result<()>;

    /// All ledger rows, in no particular order
    async fn find_applied_migrations(&self) -> Result<Vec<AppliedMigration>>;

    /// Insert a row, assigning its version rank, installed rank and timestamp
    async fn add_applied_migration(&self, migration: AppliedMigration) -> Result<()>;

    /// True if the ledger holds anything other than a baseline marker
    async fn has_applied_migrations(&self) -> Result<bool> {
        if !self.tables_exist().await? {
            return Ok(false);
        }
        Ok(self
            .find_applied_migrations()
            .await?
            .iter()
            .any(|m| m.migration_type != MigrationType::Baseline))
    }

    async fn baseline_marker(&self) -> Result<Option<AppliedMigration>> {
        if !self.tables_exist().await? {
            return Ok(None);
        }
        Ok(self
            .find_applied_migrations()
            .await?
            .into_iter()
            .find(|m| m.migration_type == MigrationType::Baseline))
    }

    async fn has_baseline_marker(&self) -> Result<bool> {
        Ok(self.baseline_marker().await?.is_some())
    }

    async fn add_baseline_marker(
        &self,
        version: MigrationVersion,
        description: &str,
        installed_by: &str,
    ) -> Result<()> {
        self.add_applied_migration(AppliedMigration::new(
            version,
            description,
            MigrationType::Baseline,
            description,
            Some(0),
            installed_by,
            0,
            true,
        ))
        .await
    }
}

/// 1-based position `version` takes among the versions already in the ledger
pub fn calculate_version_rank(existing: &[MigrationVersion], version: &MigrationVersion) -> i32 {
    let mut sorted: Vec<&MigrationVersion> = existing.iter().collect();
    sorted.sort();

    let position = sorted
        .iter()
        .position(|existing| version < *existing)
        .unwrap_or(sorted.len());

    position as i32 + 1
}
