//! Ledger and session backed by a live cluster through the `scylla` driver

use crate::db::dao::{
    COUNTS_TABLE_SUFFIX, INSTALLED_RANK_COUNTER, SchemaVersionDao, calculate_version_rank,
};
use crate::db::session::CqlSession;
use crate::migration::{AppliedMigration, MigrationType, MigrationVersion};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::Session;
use scylla::frame::value::{Counter, CqlTimestamp};
use scylla::query::Query;
use scylla::statement::Consistency;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct CassandraSession {
    session: Arc<Session>,
}

impl CassandraSession {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CqlSession for CassandraSession {
    async fn execute(&self, statement: &str, timeout: Option<Duration>) -> Result<()> {
        let mut query = Query::new(statement);
        query.set_request_timeout(timeout);
        self.session.query(query, ()).await?;
        Ok(())
    }
}

type LedgerRow = (
    Option<i32>,
    Option<i32>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i32>,
    Option<CqlTimestamp>,
    Option<String>,
    Option<i32>,
    Option<bool>,
);

pub struct CassandraSchemaVersionDao {
    session: Arc<Session>,
    keyspace: String,
    table_name: String,
    consistency: Consistency,
}

impl CassandraSchemaVersionDao {
    pub fn new(session: Arc<Session>, keyspace: &str, table_name: &str) -> Self {
        let node_count = session.get_cluster_data().get_nodes_info().len();
        let consistency = if node_count > 1 {
            Consistency::All
        } else {
            Consistency::One
        };

        Self {
            session,
            keyspace: keyspace.to_string(),
            table_name: table_name.to_string(),
            consistency,
        }
    }

    fn qualified_table(&self) -> String {
        format!("{}.{}", self.keyspace, self.table_name)
    }

    fn qualified_counts_table(&self) -> String {
        format!("{}.{}{}", self.keyspace, self.table_name, COUNTS_TABLE_SUFFIX)
    }

    fn query(&self, text: String) -> Query {
        let mut query = Query::new(text);
        query.set_consistency(self.consistency);
        query
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let result = self
            .session
            .query(
                self.query(
                    "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ? AND table_name = ?"
                        .to_string(),
                ),
                (self.keyspace.as_str(), table),
            )
            .await
            .with_context(|| format!("Failed to look up table {}", table))?;

        Ok(result.rows_typed::<(String,)>()?.next().is_some())
    }

    async fn next_installed_rank(&self) -> Result<i32> {
        self.session
            .query(
                self.query(format!(
                    "UPDATE {} SET count = count + 1 WHERE name = '{}'",
                    self.qualified_counts_table(),
                    INSTALLED_RANK_COUNTER
                )),
                (),
            )
            .await
            .context("Failed to increment installed rank counter")?;

        let result = self
            .session
            .query(
                self.query(format!(
                    "SELECT count FROM {} WHERE name = ?",
                    self.qualified_counts_table()
                )),
                (INSTALLED_RANK_COUNTER,),
            )
            .await
            .context("Failed to read installed rank counter")?;

        let (Counter(count),) = result
            .rows_typed::<(Counter,)>()?
            .next()
            .ok_or_else(|| anyhow!("Installed rank counter row is missing"))??;

        i32::try_from(count).context("Installed rank counter overflowed")
    }

    async fn existing_versions(&self) -> Result<Vec<MigrationVersion>> {
        let result = self
            .session
            .query(
                self.query(format!("SELECT version FROM {}", self.qualified_table())),
                (),
            )
            .await
            .context("Failed to read ledger versions")?;

        result
            .rows_typed::<(String,)>()?
            .map(|row| {
                let (version,) = row?;
                Ok(MigrationVersion::from_version(Some(&version))?)
            })
            .collect()
    }
}

fn row_to_applied(row: LedgerRow) -> Result<AppliedMigration> {
    let (
        version_rank,
        installed_rank,
        version,
        description,
        migration_type,
        script,
        checksum,
        installed_on,
        installed_by,
        execution_time,
        success,
    ) = row;

    let migration_type = migration_type
        .ok_or_else(|| anyhow!("Ledger row for version {} has no type", version))?
        .parse::<MigrationType>()?;

    Ok(AppliedMigration {
        version_rank: version_rank.unwrap_or_default(),
        installed_rank: installed_rank.unwrap_or_default(),
        version: MigrationVersion::from_version(Some(&version))?,
        description: description.unwrap_or_default(),
        migration_type,
        script: script.unwrap_or_default(),
        checksum,
        installed_on: installed_on.and_then(|CqlTimestamp(ms)| DateTime::<Utc>::from_timestamp_millis(ms)),
        installed_by: installed_by.unwrap_or_default(),
        execution_time: execution_time.unwrap_or_default(),
        success: success.unwrap_or_default(),
    })
}

#[async_trait]
impl SchemaVersionDao for CassandraSchemaVersionDao {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn keyspace(&self) -> &str {
        &self.keyspace
    }

    async fn tables_exist(&self) -> Result<bool> {
        let counts_table = format!("{}{}", self.table_name, COUNTS_TABLE_SUFFIX);
        Ok(self.table_exists(&self.table_name).await? && self.table_exists(&counts_table).await?)
    }

    async fn create_tables_if_not_exist(&self) -> Result<()> {
        if self.tables_exist().await? {
            return Ok(());
        }

        self.session
            .query(
                self.query(format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     version_rank int, \
                     installed_rank int, \
                     version text, \
                     description text, \
                     script text, \
                     checksum int, \
                     type text, \
                     installed_by text, \
                     installed_on timestamp, \
                     execution_time int, \
                     success boolean, \
                     PRIMARY KEY (version))",
                    self.qualified_table()
                )),
                (),
            )
            .await
            .with_context(|| format!("Failed to create ledger table {}", self.table_name))?;

        self.session
            .query(
                self.query(format!(
                    "CREATE TABLE IF NOT EXISTS {} (name text, count counter, PRIMARY KEY (name))",
                    self.qualified_counts_table()
                )),
                (),
            )
            .await
            .with_context(|| format!("Failed to create counter table for {}", self.table_name))?;

        debug!("Created ledger tables for {}", self.qualified_table());
        Ok(())
    }

    async fn find_applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        if !self.tables_exist().await? {
            return Ok(Vec::new());
        }

        let result = self
            .session
            .query(
                self.query(format!(
                    "SELECT version_rank, installed_rank, version, description, type, script, \
                     checksum, installed_on, installed_by, execution_time, success FROM {}",
                    self.qualified_table()
                )),
                (),
            )
            .await
            .context("Failed to read applied migrations")?;

        result
            .rows_typed::<LedgerRow>()?
            .map(|row| row_to_applied(row?))
            .collect()
    }

    async fn add_applied_migration(&self, migration: AppliedMigration) -> Result<()> {
        self.create_tables_if_not_exist().await?;

        let version_rank = calculate_version_rank(&self.existing_versions().await?, &migration.version);
        let installed_rank = self.next_installed_rank().await?;
        let version = migration
            .version
            .version_string()
            .ok_or_else(|| anyhow!("Cannot record a migration without a version"))?;

        self.session
            .query(
                self.query(format!(
                    "INSERT INTO {} (version_rank, installed_rank, version, description, type, script, \
                     checksum, installed_on, installed_by, execution_time, success) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, toTimestamp(now()), ?, ?, ?)",
                    self.qualified_table()
                )),
                (
                    version_rank,
                    installed_rank,
                    version.as_str(),
                    migration.description.as_str(),
                    migration.migration_type.as_str(),
                    migration.script.as_str(),
                    migration.checksum,
                    migration.installed_by.as_str(),
                    migration.execution_time,
                    migration.success,
                ),
            )
            .await
            .with_context(|| format!("Failed to record migration {}", migration.version))?;

        debug!(
            "Ledger table {} successfully updated to reflect changes",
            self.table_name
        );
        Ok(())
    }
}
