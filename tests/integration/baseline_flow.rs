//! Adopting an existing keyspace: baseline first, then migrate only what
//! comes after the baseline.

use crate::helpers::project::with_migration_project;
use anyhow::Result;
use cqlmigrate::MigrationError;
use cqlmigrate::commands::{Baseline, Migrate, Validate};
use cqlmigrate::db::SchemaVersionDao;
use cqlmigrate::info::MigrationInfoService;
use cqlmigrate::migration::{MigrationState, MigrationType, MigrationVersion};

fn v(s: &str) -> MigrationVersion {
    MigrationVersion::parse(s).unwrap()
}

#[tokio::test]
async fn test_migrate_after_baseline_skips_older_scripts() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);")?;
        project.write_script("V2__Create_orders.cql", "CREATE TABLE orders (id int PRIMARY KEY);")?;
        project.write_script("V3__Create_audit.cql", "CREATE TABLE audit (id int PRIMARY KEY);")?;

        Baseline::new(&project.dao, v("2"), "<< Cassandra Baseline >>")
            .installed_by("ops")
            .run()
            .await?;

        let resolver = project.resolver()?;
        let applied = Migrate::new(&resolver, &project.dao, &project.session)
            .run()
            .await?;
        assert_eq!(applied, 1);
        assert_eq!(
            project.session.executed(),
            vec!["CREATE TABLE audit (id int PRIMARY KEY)".to_string()]
        );

        let mut info = MigrationInfoService::new(&resolver, &project.dao, MigrationVersion::Latest, false, true);
        info.refresh().await?;
        let states: Vec<(String, MigrationState)> = info
            .all()
            .iter()
            .map(|r| (r.version().to_string(), r.state()))
            .collect();
        // The marker pairs with the local V2 script, so it reads as applied
        assert_eq!(
            states,
            vec![
                ("1".to_string(), MigrationState::BelowBaseline),
                ("2".to_string(), MigrationState::Success),
                ("3".to_string(), MigrationState::Success),
            ]
        );

        assert_eq!(Validate::new(&resolver, &project.dao).run().await?, None);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_baseline_is_rejected_once_migrations_ran() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);")?;
        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;

        let err = Baseline::new(&project.dao, v("1"), "<< Cassandra Baseline >>")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::BaselineAlreadyMigrated { .. }));

        let markers = project
            .dao
            .find_applied_migrations()
            .await?
            .into_iter()
            .filter(|r| r.migration_type == MigrationType::Baseline)
            .count();
        assert_eq!(markers, 0);
        Ok(())
    })
    .await
}
