use crate::migration::{MigrationType, MigrationVersion};
use chrono::{DateTime, Utc};

const MAX_DESCRIPTION_LENGTH: usize = 200;
const MAX_SCRIPT_LENGTH: usize = 1000;

/// One row of the applied-migration ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Position among all ledger versions in numeric order, assigned on insert
    pub version_rank: i32,
    /// Insertion counter, assigned on insert
    pub installed_rank: i32,
    pub version: MigrationVersion,
    pub description: String,
    pub migration_type: MigrationType,
    pub script: String,
    pub checksum: Option<i32>,
    pub installed_on: Option<DateTime<Utc>>,
    pub installed_by: String,
    /// Milliseconds
    pub execution_time: i32,
    pub success: bool,
}

impl AppliedMigration {
    /// Build a row about to be inserted. Ranks and the install timestamp are
    /// filled in by the ledger.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: MigrationVersion,
        description: &str,
        migration_type: MigrationType,
        script: &str,
        checksum: Option<i32>,
        installed_by: &str,
        execution_time: i32,
        success: bool,
    ) -> Self {
        Self {
            version_rank: 0,
            installed_rank: 0,
            version,
            description: abbreviate_description(description),
            migration_type,
            script: abbreviate_script(script),
            checksum,
            installed_on: None,
            installed_by: installed_by.to_string(),
            execution_time,
            success,
        }
    }
}

/// Form in which a description is stored in the ledger
pub fn abbreviate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_LENGTH {
        return description.to_string();
    }
    let head: String = description
        .chars()
        .take(MAX_DESCRIPTION_LENGTH - 3)
        .collect();
    format!("{}...", head)
}

/// Long scripts keep their head, with the first three characters replaced by `...`
fn abbreviate_script(script: &str) -> String {
    if script.chars().count() <= MAX_SCRIPT_LENGTH {
        return script.to_string();
    }
    let body: String = script
        .chars()
        .skip(3)
        .take(MAX_SCRIPT_LENGTH - 3)
        .collect();
    format!("...{}", body)
}
