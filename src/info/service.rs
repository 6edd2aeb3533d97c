use crate::db::SchemaVersionDao;
use crate::error::Result;
use crate::info::context::MigrationInfoContext;
use crate::info::record::MigrationRecord;
use crate::migration::{
    AppliedMigration, MigrationState, MigrationType, MigrationVersion, ResolvedMigration,
};
use crate::resolver::MigrationResolver;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Reconciles resolved migrations against the ledger.
///
/// Each [`refresh`](Self::refresh) re-reads both sides and recomputes every
/// record; queries only look at the last refresh.
pub struct MigrationInfoService<'a> {
    resolver: &'a dyn MigrationResolver,
    dao: &'a dyn SchemaVersionDao,
    target: MigrationVersion,
    out_of_order: bool,
    pending_or_future: bool,
    records: Vec<MigrationRecord>,
}

impl<'a> MigrationInfoService<'a> {
    pub fn new(
        resolver: &'a dyn MigrationResolver,
        dao: &'a dyn SchemaVersionDao,
        target: MigrationVersion,
        out_of_order: bool,
        pending_or_future: bool,
    ) -> Self {
        Self {
            resolver,
            dao,
            target,
            out_of_order,
            pending_or_future,
            records: Vec::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let resolved = self.resolver.resolve_migrations()?;
        let applied = self.dao.find_applied_migrations().await?;

        self.records = merge_resolved_and_applied(
            resolved,
            applied,
            &self.target,
            self.out_of_order,
            self.pending_or_future,
        );

        if self.target == MigrationVersion::Current
            && let Some(current) = self.current()
        {
            self.target = current.version().clone();
        }
        Ok(())
    }

    pub fn all(&self) -> &[MigrationRecord] {
        &self.records
    }

    /// The highest record in an applied state
    pub fn current(&self) -> Option<&MigrationRecord> {
        self.records.iter().rev().find(|r| r.state().is_applied())
    }

    pub fn pending(&self) -> Vec<&MigrationRecord> {
        self.with_state(|s| s == MigrationState::Pending)
    }

    pub fn applied(&self) -> Vec<&MigrationRecord> {
        self.with_state(|s| s.is_applied())
    }

    pub fn resolved(&self) -> Vec<&MigrationRecord> {
        self.with_state(|s| s.is_resolved())
    }

    pub fn failed(&self) -> Vec<&MigrationRecord> {
        self.with_state(|s| s.is_failed())
    }

    pub fn future(&self) -> Vec<&MigrationRecord> {
        self.with_state(|s| s == MigrationState::FutureSuccess)
    }

    pub fn out_of_order(&self) -> Vec<&MigrationRecord> {
        self.with_state(|s| s == MigrationState::OutOfOrder)
    }

    /// First validation problem across all records
    pub fn validate(&self) -> Option<String> {
        self.records.iter().find_map(|r| r.validate())
    }

    fn with_state(&self, predicate: impl Fn(MigrationState) -> bool) -> Vec<&MigrationRecord> {
        self.records
            .iter()
            .filter(|r| predicate(r.state()))
            .collect()
    }
}

/// Pair up resolved and applied migrations by version, sorted ascending.
///
/// A `Current` target is resolved to the highest applied version, or to no
/// target at all when nothing has been applied.
pub fn merge_resolved_and_applied(
    resolved: Vec<ResolvedMigration>,
    applied: Vec<AppliedMigration>,
    target: &MigrationVersion,
    out_of_order: bool,
    pending_or_future: bool,
) -> Vec<MigrationRecord> {
    let mut context = MigrationInfoContext::new(out_of_order, pending_or_future, None);

    let mut resolved_by_version: BTreeMap<MigrationVersion, ResolvedMigration> = BTreeMap::new();
    for migration in resolved {
        let Some(version) = migration.version.clone() else {
            warn!(
                "Skipping unversioned migration {} from {}",
                migration.description, migration.physical_location
            );
            continue;
        };
        if version > context.last_resolved {
            context.last_resolved = version.clone();
        }
        resolved_by_version.insert(version, migration);
    }

    let mut applied_by_version: BTreeMap<MigrationVersion, AppliedMigration> = BTreeMap::new();
    for migration in applied {
        let version = migration.version.clone();
        if version > context.last_applied {
            context.last_applied = version.clone();
        }
        match migration.migration_type {
            MigrationType::Schema => context.schema = Some(version.clone()),
            MigrationType::Baseline => context.baseline = Some(version.clone()),
            _ => {}
        }
        applied_by_version.insert(version, migration);
    }

    context.target = match target {
        MigrationVersion::Current => applied_by_version.keys().next_back().cloned(),
        other => Some(other.clone()),
    };

    let context = Arc::new(context);
    let versions: Vec<MigrationVersion> = resolved_by_version
        .keys()
        .merge(applied_by_version.keys())
        .dedup()
        .cloned()
        .collect();

    versions
        .into_iter()
        .map(|version| {
            let resolved = resolved_by_version.remove(&version);
            let applied = applied_by_version.remove(&version);
            MigrationRecord::new(version, resolved, applied, Arc::clone(&context))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CqlSession, InMemorySchemaVersionDao};
    use crate::migration::MigrationExecutor;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl MigrationExecutor for Noop {
        async fn execute(&self, _session: &dyn CqlSession) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Fixed(Vec<ResolvedMigration>);

    impl MigrationResolver for Fixed {
        fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>> {
            Ok(self.0.clone())
        }
    }

    fn v(s: &str) -> MigrationVersion {
        MigrationVersion::parse(s).unwrap()
    }

    fn resolved(version: &str) -> ResolvedMigration {
        ResolvedMigration {
            version: Some(v(version)),
            description: format!("Migration {}", version),
            script: format!("V{}__Migration.cql", version),
            checksum: Some(1),
            migration_type: MigrationType::Cql,
            physical_location: format!("db/migration/V{}__Migration.cql", version),
            executor: Arc::new(Noop),
        }
    }

    fn applied(version: &str, rank: i32, success: bool) -> AppliedMigration {
        let mut row = AppliedMigration::new(
            v(version),
            &format!("Migration {}", version),
            MigrationType::Cql,
            &format!("V{}__Migration.cql", version),
            Some(1),
            "",
            5,
            success,
        );
        row.version_rank = rank;
        row.installed_rank = rank;
        row
    }

    async fn service_for(
        resolver: &Fixed,
        dao: &InMemorySchemaVersionDao,
        target: MigrationVersion,
        out_of_order: bool,
    ) -> Vec<(String, MigrationState)> {
        let mut service = MigrationInfoService::new(resolver, dao, target, out_of_order, true);
        service.refresh().await.unwrap();
        service
            .all()
            .iter()
            .map(|r| (r.version().to_string(), r.state()))
            .collect()
    }

    #[tokio::test]
    async fn test_pending_after_applied() {
        let resolver = Fixed(vec![resolved("1"), resolved("2")]);
        let dao = InMemorySchemaVersionDao::with_rows("ks", "t", vec![applied("1", 1, true)]);

        let mut service = MigrationInfoService::new(&resolver, &dao, MigrationVersion::Latest, false, true);
        service.refresh().await.unwrap();

        assert_eq!(service.pending().len(), 1);
        assert_eq!(service.pending()[0].version(), &v("2"));
        assert_eq!(service.current().map(|r| r.version().clone()), Some(v("1")));
        assert_eq!(service.applied().len(), 1);
        assert_eq!(service.resolved().len(), 2);
    }

    #[tokio::test]
    async fn test_ignored_when_out_of_order_disabled() {
        let resolver = Fixed(vec![resolved("1"), resolved("2")]);
        let dao = InMemorySchemaVersionDao::with_rows("ks", "t", vec![applied("2", 1, true)]);

        let states = service_for(&resolver, &dao, MigrationVersion::Latest, false).await;
        assert_eq!(
            states,
            vec![
                ("1".to_string(), MigrationState::Ignored),
                ("2".to_string(), MigrationState::Success)
            ]
        );

        let mut service = MigrationInfoService::new(&resolver, &dao, MigrationVersion::Latest, false, true);
        service.refresh().await.unwrap();
        assert_eq!(service.current().map(|r| r.version().clone()), Some(v("2")));
    }

    #[tokio::test]
    async fn test_pending_when_out_of_order_enabled() {
        let resolver = Fixed(vec![resolved("1"), resolved("2")]);
        let dao = InMemorySchemaVersionDao::with_rows("ks", "t", vec![applied("2", 1, true)]);

        let states = service_for(&resolver, &dao, MigrationVersion::Latest, true).await;
        assert_eq!(states[0], ("1".to_string(), MigrationState::Pending));
    }

    #[tokio::test]
    async fn test_future_migrations() {
        let resolver = Fixed(vec![resolved("1")]);
        let dao = InMemorySchemaVersionDao::with_rows(
            "ks",
            "t",
            vec![applied("1", 1, true), applied("2", 2, false)],
        );

        let mut service = MigrationInfoService::new(&resolver, &dao, MigrationVersion::Latest, false, true);
        service.refresh().await.unwrap();

        let states: Vec<MigrationState> = service.all().iter().map(|r| r.state()).collect();
        assert_eq!(states, vec![MigrationState::Success, MigrationState::FutureFailed]);
        assert_eq!(service.failed().len(), 1);
        assert!(service.future().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_target_caps_pending() {
        let resolver = Fixed(vec![resolved("1"), resolved("2"), resolved("3")]);
        let dao = InMemorySchemaVersionDao::new("ks", "t");

        let states = service_for(&resolver, &dao, v("2"), false).await;
        assert_eq!(
            states.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            vec![
                MigrationState::Pending,
                MigrationState::Pending,
                MigrationState::AboveTarget
            ]
        );
    }

    #[tokio::test]
    async fn test_current_target_holds_back_new_migrations() {
        let resolver = Fixed(vec![resolved("1"), resolved("2")]);
        let dao = InMemorySchemaVersionDao::with_rows("ks", "t", vec![applied("1", 1, true)]);

        let states = service_for(&resolver, &dao, MigrationVersion::Current, false).await;
        assert_eq!(states[1], ("2".to_string(), MigrationState::AboveTarget));

        let empty = InMemorySchemaVersionDao::new("ks", "t");
        let states = service_for(&resolver, &empty, MigrationVersion::Current, false).await;
        assert!(states.iter().all(|(_, s)| *s == MigrationState::AboveTarget));
    }

    #[tokio::test]
    async fn test_validate_returns_first_problem() {
        let resolver = Fixed(vec![resolved("1"), resolved("2")]);
        let dao = InMemorySchemaVersionDao::with_rows("ks", "t", vec![applied("1", 1, true)]);

        let mut service = MigrationInfoService::new(&resolver, &dao, MigrationVersion::Latest, true, false);
        service.refresh().await.unwrap();
        assert_eq!(
            service.validate().as_deref(),
            Some("Detected resolved migration not applied to database: 2")
        );
    }
}
