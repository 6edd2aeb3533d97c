use crate::helpers::project::with_migration_project;
use anyhow::Result;
use cqlmigrate::MigrationError;
use cqlmigrate::commands::{Info, Migrate, Validate};
use cqlmigrate::resolver::calculate_checksum;

#[tokio::test]
async fn test_validate_passes_after_migrate() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);")?;
        project.write_script("V2__Create_orders.cql", "CREATE TABLE orders (id int PRIMARY KEY);")?;

        let resolver = project.resolver()?;
        Migrate::new(&resolver, &project.dao, &project.session)
            .run()
            .await?;

        assert_eq!(Validate::new(&resolver, &project.dao).run().await?, None);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_edited_script_is_reported_with_both_checksums() -> Result<()> {
    with_migration_project(async |project| {
        let original = "CREATE TABLE users (id int PRIMARY KEY);";
        let edited = "CREATE TABLE users (id int PRIMARY KEY, name text);";

        project.write_script("V1__Create_users.cql", original)?;
        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;

        project.write_script("V1__Create_users.cql", edited)?;
        let err = Validate::new(&project.resolver()?, &project.dao)
            .run_strict()
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::ValidationFailed(_)));
        assert_eq!(
            err.to_string(),
            format!(
                "Validation failed. Migration Checksum mismatch for migration 1\n-> Applied to database : {}\n-> Resolved locally    : {}",
                calculate_checksum(original),
                calculate_checksum(edited)
            )
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_line_endings_do_not_change_checksum() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);\n")?;
        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;

        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);\r\n")?;
        assert_eq!(
            Validate::new(&project.resolver()?, &project.dao).run().await?,
            None
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_deleted_script_is_reported() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);")?;
        project.write_script("V2__Create_orders.cql", "CREATE TABLE orders (id int PRIMARY KEY);")?;
        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;

        project.remove_script("V1__Create_users.cql")?;
        let message = Validate::new(&project.resolver()?, &project.dao).run().await?;
        assert_eq!(
            message.as_deref(),
            Some("Detected applied migration not resolved locally: 1")
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_info_lists_applied_and_pending_migrations() -> Result<()> {
    with_migration_project(async |project| {
        project.write_script("V1__Create_users.cql", "CREATE TABLE users (id int PRIMARY KEY);")?;
        Migrate::new(&project.resolver()?, &project.dao, &project.session)
            .run()
            .await?;
        project.write_script("V2__Create_orders.cql", "CREATE TABLE orders (id int PRIMARY KEY);")?;

        let table = Info::new(&project.resolver()?, &project.dao).run().await?;
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[1].starts_with("| Version | Description "));
        let users = lines.iter().find(|l| l.contains("Create users")).unwrap();
        assert!(users.starts_with("| 1       |"));
        assert!(users.ends_with("| Success |"));
        let orders = lines.iter().find(|l| l.contains("Create orders")).unwrap();
        assert!(orders.starts_with("| 2       |"));
        assert!(orders.ends_with("| Pending |"));
        Ok(())
    })
    .await
}
