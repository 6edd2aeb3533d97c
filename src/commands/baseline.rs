use crate::commands::context::CommandContext;
use crate::commands::initialize::Initialize;
use crate::config::Config;
use crate::constants::SCHEMA_CREATION_VERSION;
use crate::db::SchemaVersionDao;
use crate::error::{MigrationError, Result};
use crate::migration::MigrationVersion;
use tracing::info;

/// Marks an existing keyspace as being at a given version
pub struct Baseline<'a> {
    dao: &'a dyn SchemaVersionDao,
    version: MigrationVersion,
    description: String,
    installed_by: String,
}

impl<'a> Baseline<'a> {
    pub fn new(dao: &'a dyn SchemaVersionDao, version: MigrationVersion, description: &str) -> Self {
        Self {
            dao,
            version,
            description: description.to_string(),
            installed_by: String::new(),
        }
    }

    pub fn installed_by(mut self, user: &str) -> Self {
        self.installed_by = user.to_string();
        self
    }

    pub async fn run(&self) -> Result<()> {
        let table = self.dao.table_name().to_string();
        Initialize::new(self.dao).run().await?;

        if self.dao.has_applied_migrations().await? {
            return Err(MigrationError::BaselineAlreadyMigrated { table });
        }

        if let Some(marker) = self.dao.baseline_marker().await? {
            if marker.version != self.version || marker.description != self.description {
                return Err(MigrationError::BaselineMismatch {
                    table,
                    requested_version: self.version.clone(),
                    requested_description: self.description.clone(),
                    existing_version: marker.version,
                    existing_description: marker.description,
                });
            }
            info!(
                "Keyspace {} is already baselined at version {}",
                self.dao.keyspace(),
                self.version
            );
            return Ok(());
        }

        if self.version == MigrationVersion::parse(SCHEMA_CREATION_VERSION)? {
            return Err(MigrationError::BaselineReservedVersion { table });
        }

        self.dao
            .add_baseline_marker(self.version.clone(), &self.description, &self.installed_by)
            .await?;
        info!(
            "Successfully baselined keyspace {} with version {}",
            self.dao.keyspace(),
            self.version
        );
        Ok(())
    }
}

pub async fn cmd_baseline(config: &Config) -> anyhow::Result<()> {
    let ctx = CommandContext::connect(config).await?;

    Baseline::new(
        &ctx.dao,
        config.migration.baseline_version.clone(),
        &config.migration.baseline_description,
    )
    .installed_by(&ctx.user)
    .run()
    .await?;
    Ok(())
}
