use crate::db::CqlSession;
use crate::error::{MigrationError, Result};
use crate::migration::{
    MigrationExecutor, MigrationNaming, MigrationType, MigrationVersion, ResolvedMigration,
};
use crate::resolver::MigrationResolver;
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

/// A migration written in Rust against the session.
///
/// By default the version and description come from [`CodeMigration::name`],
/// which must follow `V<version>__<Description>`.
#[async_trait]
pub trait CodeMigration: Send + Sync {
    fn name(&self) -> &str;

    /// Explicit version and description, overriding the name
    fn version_info(&self) -> Option<(MigrationVersion, String)> {
        None
    }

    fn checksum(&self) -> Option<i32> {
        Some(0)
    }

    async fn migrate(&self, session: &dyn CqlSession) -> anyhow::Result<()>;
}

/// Resolves code migrations registered by the embedding application
#[derive(Default)]
pub struct CodeMigrationResolver {
    migrations: Vec<Arc<dyn CodeMigration>>,
}

impl CodeMigrationResolver {
    pub fn new(migrations: Vec<Arc<dyn CodeMigration>>) -> Self {
        Self { migrations }
    }

    pub fn register(mut self, migration: Arc<dyn CodeMigration>) -> Self {
        self.migrations.push(migration);
        self
    }

    fn extract_migration_info(&self, migration: &Arc<dyn CodeMigration>) -> Result<ResolvedMigration> {
        let (version, description) = match migration.version_info() {
            Some((version, description)) => {
                if description.trim().is_empty() {
                    return Err(MigrationError::MissingDescription { version });
                }
                (version, description)
            }
            None => MigrationNaming::code().extract(migration.name())?,
        };

        Ok(ResolvedMigration {
            version: Some(version),
            description,
            script: migration.name().to_string(),
            checksum: migration.checksum(),
            migration_type: MigrationType::Code,
            physical_location: migration.name().to_string(),
            executor: Arc::new(CodeMigrationExecutor {
                migration: Arc::clone(migration),
            }),
        })
    }
}

impl MigrationResolver for CodeMigrationResolver {
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>> {
        let mut migrations = self
            .migrations
            .iter()
            .map(|m| self.extract_migration_info(m))
            .collect::<Result<Vec<_>>>()?;
        migrations.sort_by(|a, b| a.resolution_order(b));
        Ok(migrations)
    }
}

pub struct CodeMigrationExecutor {
    migration: Arc<dyn CodeMigration>,
}

#[async_trait]
impl MigrationExecutor for CodeMigrationExecutor {
    async fn execute(&self, session: &dyn CqlSession) -> anyhow::Result<()> {
        self.migration
            .migrate(session)
            .await
            .with_context(|| format!("Code migration {} failed", self.migration.name()))
    }
}
