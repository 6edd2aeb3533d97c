use crate::db::CqlSession;
use crate::error::{MigrationError, Result};
use crate::migration::{MigrationExecutor, MigrationNaming, MigrationType, ResolvedMigration};
use crate::resolver::MigrationResolver;
use crate::resolver::location::{Resource, ScriptsLocation};
use crate::script::CqlScript;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// CRC32 over the UTF-8 bytes of each line, so line endings and a trailing
/// newline do not affect the result
pub fn calculate_checksum(content: &str) -> i32 {
    let mut hasher = crc32fast::Hasher::new();
    for line in content.lines() {
        hasher.update(line.as_bytes());
    }
    hasher.finalize() as i32
}

/// Resolves versioned `.cql` scripts from one location
pub struct CqlMigrationResolver {
    location: ScriptsLocation,
    naming: MigrationNaming,
    statement_timeout: Option<Duration>,
}

impl CqlMigrationResolver {
    pub fn new(
        location: ScriptsLocation,
        naming: MigrationNaming,
        statement_timeout: Option<Duration>,
    ) -> Self {
        Self {
            location,
            naming,
            statement_timeout,
        }
    }

    fn extract_migration_info(&self, resource: &Resource) -> Result<ResolvedMigration> {
        let (version, description) = self.naming.extract(resource.filename())?;
        let content = resource
            .load_as_string()
            .map_err(|source| MigrationError::Resource {
                location: resource.location_on_disk.display().to_string(),
                source,
            })?;

        Ok(ResolvedMigration {
            version: Some(version),
            description,
            script: resource.location.clone(),
            checksum: Some(calculate_checksum(&content)),
            migration_type: MigrationType::Cql,
            physical_location: resource.location_on_disk.display().to_string(),
            executor: Arc::new(CqlMigrationExecutor {
                resource: resource.clone(),
                statement_timeout: self.statement_timeout,
            }),
        })
    }
}

impl MigrationResolver for CqlMigrationResolver {
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>> {
        let resources = self
            .location
            .scan(&self.naming.prefix, &self.naming.suffix)
            .map_err(|source| MigrationError::Resource {
                location: self.location.descriptor(),
                source,
            })?;

        let mut migrations = resources
            .iter()
            .map(|resource| self.extract_migration_info(resource))
            .collect::<Result<Vec<_>>>()?;
        migrations.sort_by(|a, b| a.resolution_order(b));
        Ok(migrations)
    }
}

/// Re-reads the script at execution time and runs its statements in order
pub struct CqlMigrationExecutor {
    resource: Resource,
    statement_timeout: Option<Duration>,
}

#[async_trait]
impl MigrationExecutor for CqlMigrationExecutor {
    async fn execute(&self, session: &dyn CqlSession) -> anyhow::Result<()> {
        let script = CqlScript::parse(&self.resource.load_as_string()?);
        script.execute(session, self.statement_timeout).await
    }
}
