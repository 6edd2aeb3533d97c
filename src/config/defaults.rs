use crate::config::types::*;
use crate::migration::{MigrationNaming, MigrationVersion};

impl Default for Cluster {
    fn default() -> Self {
        Self {
            contact_points: vec!["localhost".to_string()],
            port: 9042,
            username: None,
            password: None,
        }
    }
}

impl Default for Migration {
    fn default() -> Self {
        Self {
            locations: vec!["db/migration".to_string()],
            table_prefix: String::new(),
            target: MigrationVersion::Latest,
            baseline_version: MigrationVersion::Concrete {
                parts: vec!["1".to_string()],
                display: "1".to_string(),
            },
            baseline_description: "<< Cassandra Baseline >>".to_string(),
            allow_out_of_order: false,
            statement_timeout: None,
            naming: MigrationNaming::default(),
        }
    }
}
