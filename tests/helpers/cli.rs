use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "CQLMIGRATE_CONTACT_POINTS",
    "CQLMIGRATE_PORT",
    "CQLMIGRATE_USERNAME",
    "CQLMIGRATE_PASSWORD",
    "CQLMIGRATE_KEYSPACE",
    "CQLMIGRATE_LOCATIONS",
    "CQLMIGRATE_TARGET",
    "CQLMIGRATE_ALLOW_OUT_OF_ORDER",
    "CQLMIGRATE_TABLE_PREFIX",
    "RUST_LOG",
];

/// Runs the binary inside an isolated project directory
pub struct CliTestHelper {
    pub temp_dir: TempDir,
    pub project_root: PathBuf,
}

impl CliTestHelper {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project_root = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            project_root,
        }
    }

    /// Command with the project as working directory and no inherited
    /// cqlmigrate environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cqlmigrate").unwrap();
        cmd.current_dir(&self.project_root);
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.project_root.join("cqlmigrate.yaml"), contents)
            .expect("Failed to write config file");
    }
}

pub async fn with_cli_helper<F, R>(test_fn: F) -> R
where
    F: std::ops::AsyncFnOnce(&CliTestHelper) -> R,
{
    let helper = CliTestHelper::new();
    test_fn(&helper).await
}
