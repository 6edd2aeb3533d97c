//! Error types for the migration engine
//!
//! Format, conflict, state and execution failures each get their own variant so
//! callers can tell them apart. Collaborator failures (driver, filesystem) are
//! carried as `anyhow::Error` sources.

use thiserror::Error;

use crate::migration::{MigrationType, MigrationVersion};

pub type Result<T, E = MigrationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// A version string contained something other than digits, `.` or `_`
    #[error(
        "Invalid version containing non-numeric characters. Only 0..9 and . are allowed. Invalid version: {version}"
    )]
    InvalidVersionFormat { version: String },

    /// A script or code migration name did not follow `<prefix><version><separator><description><suffix>`
    #[error("Wrong migration name format: {name} (It should look like this: {example})")]
    InvalidMigrationName { name: String, example: String },

    #[error("Missing description for migration {version}")]
    MissingDescription { version: MigrationVersion },

    /// Two different resolved migrations share one version
    #[error(
        "Found more than one migration with version {version}\nOffenders:\n-> {first_location} ({first_type})\n-> {second_location} ({second_type})"
    )]
    DuplicateVersion {
        version: String,
        first_location: String,
        first_type: MigrationType,
        second_location: String,
        second_type: MigrationType,
    },

    #[error("Validation failed. {0}")]
    ValidationFailed(String),

    #[error("Unable to baseline metadata table {table} as it already contains migrations")]
    BaselineAlreadyMigrated { table: String },

    #[error(
        "Unable to baseline metadata table {table} with ({requested_version}, {requested_description}) as it has already been initialized with ({existing_version}, {existing_description})"
    )]
    BaselineMismatch {
        table: String,
        requested_version: MigrationVersion,
        requested_description: String,
        existing_version: MigrationVersion,
        existing_description: String,
    },

    #[error(
        "Unable to baseline metadata table {table} with version 0 as this version was used for schema creation"
    )]
    BaselineReservedVersion { table: String },

    /// The ledger holds a failed migration that blocks further progress
    #[error("Keyspace {keyspace} contains a failed migration to version {version}!")]
    FailedMigrationPresent {
        keyspace: String,
        version: MigrationVersion,
    },

    /// Executing a migration failed; the failure has already been recorded in the ledger
    #[error("Unable to apply migration {version} ({description})")]
    MigrationFailed {
        version: MigrationVersion,
        description: String,
        #[source]
        source: anyhow::Error,
    },

    /// A shutdown was requested; migrations after the last recorded one were not run
    #[error("Migration of keyspace {keyspace} interrupted after {applied} applied migration(s)")]
    Interrupted { keyspace: String, applied: u32 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A migration location or script could not be read
    #[error("Unable to read {location}")]
    Resource {
        location: String,
        #[source]
        source: anyhow::Error,
    },

    /// A collaborator (session, ledger) failed outside of migration execution
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

impl MigrationError {
    /// Returns true for errors raised while parsing versions or migration names
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidVersionFormat { .. } | Self::InvalidMigrationName { .. }
        )
    }

    /// Returns true for errors raised by the baseline command's state checks
    pub fn is_baseline_error(&self) -> bool {
        matches!(
            self,
            Self::BaselineAlreadyMigrated { .. }
                | Self::BaselineMismatch { .. }
                | Self::BaselineReservedVersion { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_version_message_names_both_locations() {
        let err = MigrationError::DuplicateVersion {
            version: "1.1".to_string(),
            first_location: "/db/migration/V1_1__a.cql".to_string(),
            first_type: MigrationType::Cql,
            second_location: "/other/V1_1__b.cql".to_string(),
            second_type: MigrationType::Cql,
        };

        let message = err.to_string();
        assert!(message.contains("version 1.1"));
        assert!(message.contains("-> /db/migration/V1_1__a.cql (CQL)"));
        assert!(message.contains("-> /other/V1_1__b.cql (CQL)"));
    }

    #[test]
    fn test_error_categories() {
        let format = MigrationError::InvalidVersionFormat {
            version: "1.a".to_string(),
        };
        assert!(format.is_format_error());
        assert!(!format.is_baseline_error());

        let baseline = MigrationError::BaselineReservedVersion {
            table: "cassandra_migration_version".to_string(),
        };
        assert!(baseline.is_baseline_error());
        assert!(!baseline.is_format_error());
    }
}
