use crate::migration::MigrationVersion;

/// Shared inputs for computing the state of every record in one refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfoContext {
    /// Whether migrations older than the last applied one may still run
    pub out_of_order: bool,
    /// Whether pending and future migrations are tolerated during validation
    pub pending_or_future: bool,
    /// Ceiling for pending migrations; `None` puts every unapplied migration above target
    pub target: Option<MigrationVersion>,
    /// Version of the schema creation marker, if any
    pub schema: Option<MigrationVersion>,
    /// Version of the baseline marker, if any
    pub baseline: Option<MigrationVersion>,
    pub last_resolved: MigrationVersion,
    pub last_applied: MigrationVersion,
}

impl MigrationInfoContext {
    pub fn new(out_of_order: bool, pending_or_future: bool, target: Option<MigrationVersion>) -> Self {
        Self {
            out_of_order,
            pending_or_future,
            target,
            schema: None,
            baseline: None,
            last_resolved: MigrationVersion::Empty,
            last_applied: MigrationVersion::Empty,
        }
    }

    pub fn is_below_baseline(&self, version: &MigrationVersion) -> bool {
        self.baseline.as_ref().is_some_and(|baseline| version < baseline)
    }

    pub fn is_above_baseline(&self, version: &MigrationVersion) -> bool {
        self.baseline.as_ref().is_none_or(|baseline| version > baseline)
    }

    pub fn is_above_target(&self, version: &MigrationVersion) -> bool {
        self.target.as_ref().is_none_or(|target| version > target)
    }
}

impl Default for MigrationInfoContext {
    fn default() -> Self {
        Self::new(false, false, Some(MigrationVersion::Latest))
    }
}
