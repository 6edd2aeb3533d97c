use anyhow::Result;
use cqlmigrate::commands::build_resolver;
use cqlmigrate::config::{Config, ConfigBuilder};
use cqlmigrate::db::{InMemorySchemaVersionDao, RecordingSession};
use cqlmigrate::resolver::CompositeMigrationResolver;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const KEYSPACE: &str = "app";

/// A scratch migration directory plus in-memory stand-ins for the cluster
pub struct MigrationProject {
    pub temp_dir: TempDir,
    pub dao: InMemorySchemaVersionDao,
    pub session: RecordingSession,
}

impl MigrationProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp_dir.path().join("db/migration"))
            .expect("Failed to create migration directory");

        Self {
            temp_dir,
            dao: InMemorySchemaVersionDao::new(KEYSPACE, "cassandra_migration_version"),
            session: RecordingSession::new(),
        }
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.temp_dir.path().join("db/migration")
    }

    /// Write a script relative to the migration directory
    pub fn write_script(&self, name: &str, content: &str) -> Result<()> {
        let path = self.migrations_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn remove_script(&self, name: &str) -> Result<()> {
        fs::remove_file(self.migrations_dir().join(name))?;
        Ok(())
    }

    pub fn config(&self) -> Result<Config> {
        let mut config = ConfigBuilder::new().with_env(|_| None).resolve()?;
        config.keyspace.name = Some(KEYSPACE.to_string());
        config.migration.locations = vec![path_string(&self.migrations_dir())];
        Ok(config)
    }

    /// A fresh resolver; resolvers cache their scan, so build one per run
    pub fn resolver(&self) -> Result<CompositeMigrationResolver> {
        build_resolver(&self.config()?, Vec::new())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub async fn with_migration_project<F, R>(test_fn: F) -> R
where
    F: std::ops::AsyncFnOnce(&MigrationProject) -> R,
{
    let project = MigrationProject::new();
    test_fn(&project).await
}
