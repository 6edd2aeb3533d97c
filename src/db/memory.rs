//! In-process collaborators used to drive the workflows without a cluster

use crate::db::dao::{SchemaVersionDao, calculate_version_rank};
use crate::db::session::CqlSession;
use crate::migration::AppliedMigration;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::time::Duration;

/// Session that records every statement it is asked to run.
///
/// Statements containing any of the configured failure markers are recorded
/// and then rejected, which lets tests simulate a broken migration.
#[derive(Debug, Default)]
pub struct RecordingSession {
    executed: Mutex<Vec<String>>,
    fail_on: Vec<String>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            fail_on: vec![marker.to_string()],
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|statements| statements.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CqlSession for RecordingSession {
    async fn execute(&self, statement: &str, _timeout: Option<Duration>) -> Result<()> {
        self.executed
            .lock()
            .map_err(|_| anyhow!("Recording session lock poisoned"))?
            .push(statement.to_string());

        if let Some(marker) = self.fail_on.iter().find(|m| statement.contains(m.as_str())) {
            bail!("Simulated failure on statement containing '{}'", marker);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    tables_created: bool,
    rows: Vec<AppliedMigration>,
    installed_rank: i32,
}

/// Ledger kept in memory, with the same rank assignment as the CQL ledger
#[derive(Debug)]
pub struct InMemorySchemaVersionDao {
    keyspace: String,
    table_name: String,
    state: Mutex<LedgerState>,
}

impl InMemorySchemaVersionDao {
    pub fn new(keyspace: &str, table_name: &str) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            table_name: table_name.to_string(),
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Ledger pre-populated with rows, as if written by an earlier run
    pub fn with_rows(keyspace: &str, table_name: &str, rows: Vec<AppliedMigration>) -> Self {
        let installed_rank = rows.iter().map(|r| r.installed_rank).max().unwrap_or(0);
        Self {
            keyspace: keyspace.to_string(),
            table_name: table_name.to_string(),
            state: Mutex::new(LedgerState {
                tables_created: true,
                rows,
                installed_rank,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("In-memory ledger lock poisoned"))
    }
}

#[async_trait]
impl SchemaVersionDao for InMemorySchemaVersionDao {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn keyspace(&self) -> &str {
        &self.keyspace
    }

    async fn tables_exist(&self) -> Result<bool> {
        Ok(self.lock()?.tables_created)
    }

    async fn create_tables_if_not_exist(&self) -> Result<()> {
        self.lock()?.tables_created = true;
        Ok(())
    }

    async fn find_applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        Ok(self.lock()?.rows.clone())
    }

    async fn add_applied_migration(&self, mut migration: AppliedMigration) -> Result<()> {
        let mut state = self.lock()?;
        state.tables_created = true;

        let existing: Vec<_> = state.rows.iter().map(|r| r.version.clone()).collect();
        migration.version_rank = calculate_version_rank(&existing, &migration.version);
        state.installed_rank += 1;
        migration.installed_rank = state.installed_rank;
        migration.installed_on = Some(Utc::now());

        // Keyed by version, like the CQL table
        state.rows.retain(|r| r.version != migration.version);
        state.rows.push(migration);
        Ok(())
    }
}
