use anyhow::{Result, anyhow};
use std::fmt;
use std::str::FromStr;

/// Kind of a migration, stored in the ledger's `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MigrationType {
    /// Marker for a keyspace created by the tool
    Schema,
    /// Marker written by the baseline command
    Baseline,
    /// Versioned `.cql` script
    Cql,
    /// Migration implemented in code against the session
    Code,
    /// Migration produced by a user-registered resolver
    Custom,
}

impl MigrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "SCHEMA",
            Self::Baseline => "BASELINE",
            Self::Cql => "CQL",
            Self::Code => "JAVA_DRIVER",
            Self::Custom => "CUSTOM",
        }
    }

    /// Marker types never execute anything; they only annotate the ledger
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Schema | Self::Baseline)
    }
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SCHEMA" => Ok(Self::Schema),
            "BASELINE" => Ok(Self::Baseline),
            "CQL" => Ok(Self::Cql),
            "JAVA_DRIVER" | "CODE" => Ok(Self::Code),
            "CUSTOM" => Ok(Self::Custom),
            other => Err(anyhow!("Unknown migration type in ledger: {}", other)),
        }
    }
}

/// Reconciled state of a single migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationState {
    /// Resolved, not applied, eligible to run
    Pending,
    /// Resolved, not applied, above the migration target
    AboveTarget,
    /// Resolved, not applied, at or below the baseline
    BelowBaseline,
    /// The baseline marker row
    Baseline,
    /// Resolved, not applied, skipped because a later version is already applied
    Ignored,
    /// Applied successfully but no longer resolved locally
    MissingSuccess,
    /// Applied with failure and no longer resolved locally
    MissingFailed,
    Success,
    Failed,
    /// Applied successfully after a later version had already been applied
    OutOfOrder,
    /// Applied successfully, newer than anything resolved locally
    FutureSuccess,
    /// Applied with failure, newer than anything resolved locally
    FutureFailed,
}

impl MigrationState {
    /// Seven-character label used in the info table
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::AboveTarget => ">Target",
            Self::BelowBaseline => "<Baseln",
            Self::Baseline => "Baselin",
            Self::Ignored => "Ignored",
            Self::MissingSuccess => "Missing",
            Self::MissingFailed => "MisFail",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::OutOfOrder => "OutOrdr",
            Self::FutureSuccess => "Future",
            Self::FutureFailed => "FutFail",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(
            self,
            Self::MissingSuccess | Self::MissingFailed | Self::FutureSuccess | Self::FutureFailed
        )
    }

    pub fn is_applied(&self) -> bool {
        !matches!(
            self,
            Self::Pending | Self::AboveTarget | Self::BelowBaseline | Self::Ignored
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::MissingFailed | Self::Failed | Self::FutureFailed
        )
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
