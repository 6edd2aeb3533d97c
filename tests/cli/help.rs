use crate::helpers::cli::with_cli_helper;
use anyhow::Result;
use predicates::prelude::*;

#[tokio::test]
async fn test_help_lists_commands() -> Result<()> {
    with_cli_helper(async |helper| {
        helper
            .command()
            .arg("--help")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("migrate")
                    .and(predicate::str::contains("validate"))
                    .and(predicate::str::contains("baseline"))
                    .and(predicate::str::contains("info")),
            );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_migrate_help_shows_connection_options() -> Result<()> {
    with_cli_helper(async |helper| {
        helper
            .command()
            .args(["migrate", "--help"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("--contact-points")
                    .and(predicate::str::contains("--keyspace"))
                    .and(predicate::str::contains("--allow-out-of-order"))
                    .and(predicate::str::contains("--target")),
            );
        Ok(())
    })
    .await
}
