use crate::info::context::MigrationInfoContext;
use crate::migration::{
    AppliedMigration, MigrationState, MigrationType, MigrationVersion, ResolvedMigration,
    abbreviate_description,
};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::sync::Arc;

/// A version as seen from both sides: what was resolved locally and what the
/// ledger says was applied. At least one side is always present.
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    resolved: Option<ResolvedMigration>,
    applied: Option<AppliedMigration>,
    version: MigrationVersion,
    context: Arc<MigrationInfoContext>,
}

impl MigrationRecord {
    pub(crate) fn new(
        version: MigrationVersion,
        resolved: Option<ResolvedMigration>,
        applied: Option<AppliedMigration>,
        context: Arc<MigrationInfoContext>,
    ) -> Self {
        Self {
            resolved,
            applied,
            version,
            context,
        }
    }

    pub fn resolved(&self) -> Option<&ResolvedMigration> {
        self.resolved.as_ref()
    }

    pub fn applied(&self) -> Option<&AppliedMigration> {
        self.applied.as_ref()
    }

    pub fn version(&self) -> &MigrationVersion {
        &self.version
    }

    pub fn description(&self) -> &str {
        match (&self.applied, &self.resolved) {
            (Some(applied), _) => &applied.description,
            (None, Some(resolved)) => &resolved.description,
            (None, None) => "",
        }
    }

    pub fn migration_type(&self) -> Option<MigrationType> {
        self.applied
            .as_ref()
            .map(|a| a.migration_type)
            .or_else(|| self.resolved.as_ref().map(|r| r.migration_type))
    }

    pub fn script(&self) -> Option<&str> {
        self.applied
            .as_ref()
            .map(|a| a.script.as_str())
            .or_else(|| self.resolved.as_ref().map(|r| r.script.as_str()))
    }

    pub fn checksum(&self) -> Option<i32> {
        match (&self.applied, &self.resolved) {
            (Some(applied), _) => applied.checksum,
            (None, Some(resolved)) => resolved.checksum,
            (None, None) => None,
        }
    }

    pub fn installed_on(&self) -> Option<DateTime<Utc>> {
        self.applied.as_ref().and_then(|a| a.installed_on)
    }

    pub fn execution_time(&self) -> Option<i32> {
        self.applied.as_ref().map(|a| a.execution_time)
    }

    pub fn state(&self) -> MigrationState {
        let ctx = &self.context;
        let version = &self.version;

        match (&self.resolved, &self.applied) {
            (_, None) if ctx.is_below_baseline(version) => MigrationState::BelowBaseline,
            (_, None) if ctx.is_above_target(version) => MigrationState::AboveTarget,
            (_, None) if *version < ctx.last_applied && !ctx.out_of_order => {
                MigrationState::Ignored
            }
            (_, None) => MigrationState::Pending,

            (None, Some(applied)) if applied.migration_type == MigrationType::Schema => {
                MigrationState::Success
            }
            (None, Some(applied)) if applied.migration_type == MigrationType::Baseline => {
                MigrationState::Baseline
            }
            (None, Some(applied)) if *version < ctx.last_resolved => {
                if applied.success {
                    MigrationState::MissingSuccess
                } else {
                    MigrationState::MissingFailed
                }
            }
            (None, Some(applied)) if *version > ctx.last_resolved => {
                if applied.success {
                    MigrationState::FutureSuccess
                } else {
                    MigrationState::FutureFailed
                }
            }

            (_, Some(applied)) if !applied.success => MigrationState::Failed,
            (_, Some(applied)) if applied.version_rank != applied.installed_rank => {
                MigrationState::OutOfOrder
            }
            (_, Some(_)) => MigrationState::Success,
        }
    }

    /// First consistency problem with this record, if any
    pub fn validate(&self) -> Option<String> {
        let ctx = &self.context;

        if !ctx.pending_or_future
            && self.resolved.is_none()
            && let Some(applied) = &self.applied
            && !applied.migration_type.is_marker()
        {
            return Some(format!(
                "Detected applied migration not resolved locally: {}",
                self.version
            ));
        }

        if !ctx.pending_or_future
            && matches!(self.state(), MigrationState::Pending | MigrationState::Ignored)
        {
            return Some(format!(
                "Detected resolved migration not applied to database: {}",
                self.version
            ));
        }

        if let (Some(resolved), Some(applied)) = (&self.resolved, &self.applied)
            && ctx.is_above_baseline(&self.version)
        {
            if resolved.migration_type != applied.migration_type {
                return Some(mismatch_message(
                    "Type",
                    &applied.version,
                    applied.migration_type,
                    resolved.migration_type,
                ));
            }
            if resolved.checksum != applied.checksum {
                return Some(mismatch_message(
                    "Checksum",
                    &applied.version,
                    render_checksum(applied.checksum),
                    render_checksum(resolved.checksum),
                ));
            }
            // Ledger rows hold the abbreviated description
            if abbreviate_description(&resolved.description) != applied.description {
                return Some(mismatch_message(
                    "Description",
                    &applied.version,
                    &applied.description,
                    &resolved.description,
                ));
            }
        }

        None
    }
}

fn render_checksum(checksum: Option<i32>) -> String {
    checksum.map_or_else(|| "null".to_string(), |c| c.to_string())
}

fn mismatch_message(
    field: &str,
    version: &MigrationVersion,
    applied: impl Display,
    resolved: impl Display,
) -> String {
    format!(
        "Migration {} mismatch for migration {}\n-> Applied to database : {}\n-> Resolved locally    : {}",
        field, version, applied, resolved
    )
}
