use crate::error::{MigrationError, Result};
use crate::migration::{MigrationNaming, MigrationVersion};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub cluster: Option<ClusterInput>,
    pub keyspace: Option<KeyspaceInput>,
    pub migration: Option<MigrationInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub cluster: Cluster,
    pub keyspace: Keyspace,
    pub migration: Migration,
}

impl Config {
    /// Check that a connection can be attempted, returning the keyspace name
    pub fn validate_connection(&self) -> Result<&str> {
        if self.cluster.contact_points.iter().all(|p| p.trim().is_empty()) {
            return Err(MigrationError::Configuration(
                "No cluster contact points configured".to_string(),
            ));
        }
        if self.cluster.username.is_some() && self.cluster.password.is_none() {
            return Err(MigrationError::Configuration(
                "A password is required when a username is configured".to_string(),
            ));
        }

        match self.keyspace.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(MigrationError::Configuration(
                "Keyspace name is required (set keyspace.name, --keyspace or CQLMIGRATE_KEYSPACE)"
                    .to_string(),
            )),
        }
    }
}

// Cluster configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClusterInput {
    pub contact_points: Option<Vec<String>>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub contact_points: Vec<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Cluster {
    /// `host:port` for every contact point; points that already carry a port keep it
    pub fn node_addresses(&self) -> Vec<String> {
        self.contact_points
            .iter()
            .map(|point| {
                if point.contains(':') {
                    point.clone()
                } else {
                    format!("{}:{}", point, self.port)
                }
            })
            .collect()
    }
}

// Keyspace configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeyspaceInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Keyspace {
    pub name: Option<String>,
}

// Migration configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MigrationInput {
    pub locations: Option<Vec<String>>,
    pub table_prefix: Option<String>,
    pub target: Option<String>,
    pub baseline_version: Option<String>,
    pub baseline_description: Option<String>,
    pub allow_out_of_order: Option<bool>,
    pub statement_timeout: Option<String>,
    pub script_prefix: Option<String>,
    pub script_separator: Option<String>,
    pub script_suffix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub locations: Vec<String>,
    pub table_prefix: String,
    pub target: MigrationVersion,
    pub baseline_version: MigrationVersion,
    pub baseline_description: String,
    pub allow_out_of_order: bool,
    pub statement_timeout: Option<Duration>,
    pub naming: MigrationNaming,
}

impl Migration {
    /// Ledger table name, including the configured prefix
    pub fn table_name(&self) -> String {
        format!("{}{}", self.table_prefix, crate::constants::LEDGER_TABLE_NAME)
    }
}

// CLI argument groups for command-specific options
#[derive(Debug, Clone, Default, Args)]
pub struct ClusterArgs {
    #[arg(long, value_delimiter = ',', help = "Comma-separated cluster contact points")]
    pub contact_points: Option<Vec<String>>,

    #[arg(long, help = "Native protocol port")]
    pub port: Option<u16>,

    #[arg(long, help = "Username for authentication")]
    pub username: Option<String>,

    #[arg(long, help = "Password for authentication")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct KeyspaceArgs {
    #[arg(long, short = 'k', help = "Keyspace to migrate")]
    pub keyspace: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MigrationArgs {
    #[arg(long, value_delimiter = ',', help = "Comma-separated script locations")]
    pub locations: Option<Vec<String>>,

    #[arg(long, help = "Prefix for the ledger table names")]
    pub table_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MigrateArgs {
    #[arg(long, help = "Target version ('latest', 'current' or a version)")]
    pub target: Option<String>,

    #[arg(long, help = "Allow migrations older than the current version to run")]
    pub allow_out_of_order: bool,

    #[arg(long, help = "Per-statement timeout, e.g. 30s or 1m30s")]
    pub statement_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BaselineArgs {
    #[arg(long, help = "Version to baseline the keyspace at")]
    pub baseline_version: Option<String>,

    #[arg(long, help = "Description of the baseline marker")]
    pub baseline_description: Option<String>,
}

// Conversion functions from CLI args to config input
impl From<ClusterArgs> for ClusterInput {
    fn from(args: ClusterArgs) -> Self {
        Self {
            contact_points: args.contact_points,
            port: args.port,
            username: args.username,
            password: args.password,
        }
    }
}

impl From<KeyspaceArgs> for KeyspaceInput {
    fn from(args: KeyspaceArgs) -> Self {
        Self {
            name: args.keyspace,
        }
    }
}

impl From<MigrationArgs> for MigrationInput {
    fn from(args: MigrationArgs) -> Self {
        Self {
            locations: args.locations,
            table_prefix: args.table_prefix,
            ..Self::default()
        }
    }
}

impl From<MigrateArgs> for MigrationInput {
    fn from(args: MigrateArgs) -> Self {
        Self {
            target: args.target,
            allow_out_of_order: if args.allow_out_of_order {
                Some(true)
            } else {
                None
            },
            statement_timeout: args.statement_timeout,
            ..Self::default()
        }
    }
}

impl From<BaselineArgs> for MigrationInput {
    fn from(args: BaselineArgs) -> Self {
        Self {
            baseline_version: args.baseline_version,
            baseline_description: args.baseline_description,
            ..Self::default()
        }
    }
}
