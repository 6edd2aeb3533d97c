//! Tests that the binary fails with a useful message when configuration is
//! wrong, before it ever tries to reach the cluster.

use crate::helpers::cli::with_cli_helper;
use anyhow::Result;
use predicates::prelude::*;

#[tokio::test]
async fn test_missing_keyspace_error() -> Result<()> {
    with_cli_helper(async |helper| {
        helper
            .command()
            .arg("migrate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Keyspace name is required"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_invalid_config_yaml_error() -> Result<()> {
    with_cli_helper(async |helper| {
        helper.write_config("cluster: [unbalanced");

        helper
            .command()
            .arg("info")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse config file"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_invalid_target_error() -> Result<()> {
    with_cli_helper(async |helper| {
        helper
            .command()
            .args(["migrate", "--keyspace", "app", "--target", "1.x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid migration target: 1.x"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_username_without_password_error() -> Result<()> {
    with_cli_helper(async |helper| {
        helper.write_config("keyspace:\n  name: app\ncluster:\n  username: cassandra\n");

        helper
            .command()
            .arg("validate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("password"));
        Ok(())
    })
    .await
}
