use crate::config::Config;
use crate::db::connection::connect_with_retry;
use crate::db::{CassandraSchemaVersionDao, CassandraSession};
use crate::resolver::{
    CodeMigration, CodeMigrationResolver, CompositeMigrationResolver, MigrationResolver,
    ScriptsLocations,
};
use anyhow::Result;
use std::sync::Arc;

/// Everything a command needs against a live cluster
pub struct CommandContext {
    pub session: CassandraSession,
    pub dao: CassandraSchemaVersionDao,
    pub resolver: CompositeMigrationResolver,
    pub keyspace: String,
    /// Recorded as `installed_by` in the ledger
    pub user: String,
}

impl CommandContext {
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::connect_with_code_migrations(config, Vec::new()).await
    }

    pub async fn connect_with_code_migrations(
        config: &Config,
        code_migrations: Vec<Arc<dyn CodeMigration>>,
    ) -> Result<Self> {
        let keyspace = config.validate_connection()?.to_string();
        let resolver = build_resolver(config, code_migrations)?;

        let session = Arc::new(connect_with_retry(&config.cluster, &keyspace).await?);
        let dao = CassandraSchemaVersionDao::new(
            Arc::clone(&session),
            &keyspace,
            &config.migration.table_name(),
        );

        Ok(Self {
            session: CassandraSession::new(session),
            dao,
            resolver,
            keyspace,
            user: config.cluster.username.clone().unwrap_or_default(),
        })
    }
}

/// Resolver over the configured script locations plus any code migrations
pub fn build_resolver(
    config: &Config,
    code_migrations: Vec<Arc<dyn CodeMigration>>,
) -> Result<CompositeMigrationResolver> {
    let locations = ScriptsLocations::new(&config.migration.locations)?;

    let mut custom: Vec<Box<dyn MigrationResolver>> = Vec::new();
    if !code_migrations.is_empty() {
        custom.push(Box::new(CodeMigrationResolver::new(code_migrations)));
    }

    Ok(CompositeMigrationResolver::new(
        &locations,
        &config.migration.naming,
        config.migration.statement_timeout,
        custom,
    ))
}
