//! Full migrate runs against scripts on disk, with the ledger and session
//! kept in memory.

use crate::helpers::project::{MigrationProject, with_migration_project};
use anyhow::Result;
use cqlmigrate::MigrationError;
use cqlmigrate::commands::Migrate;
use cqlmigrate::db::{RecordingSession, SchemaVersionDao};
use cqlmigrate::info::MigrationInfoService;
use cqlmigrate::migration::{MigrationState, MigrationVersion};

fn v(s: &str) -> MigrationVersion {
    MigrationVersion::parse(s).unwrap()
}

fn write_standard_scripts(project: &MigrationProject) -> Result<()> {
    project.write_script(
        "V1__Create_users.cql",
        "CREATE TABLE users (\n  id uuid PRIMARY KEY,\n  name text\n);\n\nINSERT INTO users (id, name) VALUES (uuid(), 'admin');\n",
    )?;
    project.write_script(
        "V1_1__Add_email.cql",
        "-- email is optional\nALTER TABLE users ADD email text;\n",
    )?;
    project.write_script(
        "nested/V2__Index_email.cql",
        "CREATE INDEX users_email ON users (email);\n",
    )?;
    Ok(())
}

#[tokio::test]
async fn test_fresh_keyspace_applies_scripts_in_version_order() -> Result<()> {
    with_migration_project(async |project| {
        write_standard_scripts(project)?;

        let resolver = project.resolver()?;
        let applied = Migrate::new(&resolver, &project.dao, &project.session)
            .installed_by("tester")
            .run()
            .await?;
        assert_eq!(applied, 3);

        assert_eq!(
            project.session.executed(),
            vec![
                "CREATE TABLE users (\n  id uuid PRIMARY KEY,\n  name text\n)".to_string(),
                "INSERT INTO users (id, name) VALUES (uuid(), 'admin')".to_string(),
                "ALTER TABLE users ADD email text".to_string(),
                "CREATE INDEX users_email ON users (email)".to_string(),
            ]
        );

        let mut rows = project.dao.find_applied_migrations().await?;
        rows.sort_by_key(|r| r.installed_rank);
        let versions: Vec<String> = rows.iter().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, vec!["1", "1.1", "2"]);
        assert!(rows.iter().all(|r| r.success));
        assert!(rows.iter().all(|r| r.version_rank == r.installed_rank));
        assert!(rows.iter().all(|r| r.installed_by == "tester"));
        assert_eq!(rows[2].script, "nested/V2__Index_email.cql");

        let mut info = MigrationInfoService::new(&resolver, &project.dao, MigrationVersion::Latest, false, true);
        info.refresh().await?;
        assert!(info.all().iter().all(|r| r.state() == MigrationState::Success));
        assert_eq!(info.current().map(|r| r.version().clone()), Some(v("2")));

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_second_run_is_up_to_date() -> Result<()> {
    with_migration_project(async |project| {
        write_standard_scripts(project)?;

        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;
        let executed_before = project.session.executed().len();

        let applied = Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;
        assert_eq!(applied, 0);
        assert_eq!(project.session.executed().len(), executed_before);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_failed_script_is_recorded_and_blocks_later_runs() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);")?;
        project.write_script("V2__Broken.cql", "CREATE TABLE BROKEN (id int PRIMARY KEY);")?;
        project.write_script("V3__Never_runs.cql", "CREATE TABLE later (id int PRIMARY KEY);")?;

        let session = RecordingSession::failing_on("BROKEN");
        let err = Migrate::new(&project.resolver()?, &project.dao, &session)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::MigrationFailed { .. }));
        assert!(!session.executed().iter().any(|s| s.contains("later")));

        let rows = project.dao.find_applied_migrations().await?;
        let failed = rows.iter().find(|r| r.version == v("2")).unwrap();
        assert!(!failed.success);

        let err = Migrate::new(&project.resolver()?, &project.dao, &RecordingSession::new())
            .run()
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Keyspace app contains a failed migration to version 2!"
        );

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_late_script_is_ignored_unless_out_of_order_is_allowed() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__First.cql", "CREATE TABLE one (id int PRIMARY KEY);")?;
        project.write_script("V3__Third.cql", "CREATE TABLE three (id int PRIMARY KEY);")?;
        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;

        project.write_script("V2__Second.cql", "CREATE TABLE two (id int PRIMARY KEY);")?;

        let resolver = project.resolver()?;
        let applied = Migrate::new(&resolver, &project.dao, &project.session)
            .run()
            .await?;
        assert_eq!(applied, 0);

        let mut info = MigrationInfoService::new(&resolver, &project.dao, MigrationVersion::Latest, false, true);
        info.refresh().await?;
        let late = info.all().iter().find(|r| *r.version() == v("2")).unwrap();
        assert_eq!(late.state(), MigrationState::Ignored);

        let applied = Migrate::new(&resolver, &project.dao, &project.session)
            .allow_out_of_order(true)
            .run()
            .await?;
        assert_eq!(applied, 1);

        let mut info = MigrationInfoService::new(&resolver, &project.dao, MigrationVersion::Latest, true, true);
        info.refresh().await?;
        let late = info.all().iter().find(|r| *r.version() == v("2")).unwrap();
        assert_eq!(late.state(), MigrationState::OutOfOrder);

        let row = project
            .dao
            .find_applied_migrations()
            .await?
            .into_iter()
            .find(|r| r.version == v("2"))
            .unwrap();
        assert_eq!(row.installed_rank, 3);
        assert_eq!(row.version_rank, 2);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_target_version_stops_migration_early() -> Result<()> {
    with_migration_project(async |project| {
        write_standard_scripts(project)?;

        let resolver = project.resolver()?;
        let applied = Migrate::new(&resolver, &project.dao, &project.session)
            .target(v("1.1"))
            .run()
            .await?;
        assert_eq!(applied, 2);

        let mut info = MigrationInfoService::new(&resolver, &project.dao, v("1.1"), false, true);
        info.refresh().await?;
        let last = info.all().last().unwrap();
        assert_eq!(*last.version(), v("2"));
        assert_eq!(last.state(), MigrationState::AboveTarget);

        Ok(())
    })
    .await
}
