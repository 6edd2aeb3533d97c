use crate::config::duration::parse_duration;
use crate::config::{merge::Merge, types::*};
use crate::migration::{MigrationNaming, MigrationVersion};
use anyhow::{Context, Result};

pub const ENV_CONTACT_POINTS: &str = "CQLMIGRATE_CONTACT_POINTS";
pub const ENV_PORT: &str = "CQLMIGRATE_PORT";
pub const ENV_USERNAME: &str = "CQLMIGRATE_USERNAME";
pub const ENV_PASSWORD: &str = "CQLMIGRATE_PASSWORD";
pub const ENV_KEYSPACE: &str = "CQLMIGRATE_KEYSPACE";
pub const ENV_LOCATIONS: &str = "CQLMIGRATE_LOCATIONS";
pub const ENV_TARGET: &str = "CQLMIGRATE_TARGET";
pub const ENV_ALLOW_OUT_OF_ORDER: &str = "CQLMIGRATE_ALLOW_OUT_OF_ORDER";
pub const ENV_TABLE_PREFIX: &str = "CQLMIGRATE_TABLE_PREFIX";

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Resolves configuration with precedence: file/CLI input, then environment, then defaults
pub struct ConfigBuilder {
    config_input: ConfigInput,
    env: EnvLookup,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    /// Replace the process environment, mostly for tests
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            cluster: self.resolve_cluster(&defaults.cluster)?,
            keyspace: self.resolve_keyspace(),
            migration: self.resolve_migration(&defaults.migration)?,
        })
    }

    fn env_var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.trim().is_empty())
    }

    fn env_list(&self, key: &str) -> Option<Vec<String>> {
        self.env_var(key).map(|v| split_list(&v))
    }

    fn resolve_cluster(&self, defaults: &Cluster) -> Result<Cluster> {
        let cluster_input = self.config_input.cluster.as_ref();

        let port = match cluster_input.and_then(|c| c.port) {
            Some(port) => port,
            None => match self.env_var(ENV_PORT) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {}: {}", ENV_PORT, raw))?,
                None => defaults.port,
            },
        };

        Ok(Cluster {
            contact_points: cluster_input
                .and_then(|c| c.contact_points.as_ref())
                .cloned()
                .or_else(|| self.env_list(ENV_CONTACT_POINTS))
                .unwrap_or_else(|| defaults.contact_points.clone()),
            port,
            username: cluster_input
                .and_then(|c| c.username.as_ref())
                .cloned()
                .or_else(|| self.env_var(ENV_USERNAME))
                .or_else(|| defaults.username.clone()),
            password: cluster_input
                .and_then(|c| c.password.as_ref())
                .cloned()
                .or_else(|| self.env_var(ENV_PASSWORD))
                .or_else(|| defaults.password.clone()),
        })
    }

    fn resolve_keyspace(&self) -> Keyspace {
        Keyspace {
            name: self
                .config_input
                .keyspace
                .as_ref()
                .and_then(|k| k.name.as_ref())
                .cloned()
                .or_else(|| self.env_var(ENV_KEYSPACE)),
        }
    }

    fn resolve_migration(&self, defaults: &Migration) -> Result<Migration> {
        let mig_input = self.config_input.migration.as_ref();

        let target = match mig_input
            .and_then(|m| m.target.as_ref())
            .cloned()
            .or_else(|| self.env_var(ENV_TARGET))
        {
            Some(raw) => MigrationVersion::from_version(Some(raw.trim()))
                .with_context(|| format!("Invalid migration target: {}", raw))?,
            None => defaults.target.clone(),
        };

        let baseline_version = match mig_input.and_then(|m| m.baseline_version.as_ref()) {
            Some(raw) => MigrationVersion::parse(raw.trim())
                .with_context(|| format!("Invalid baseline version: {}", raw))?,
            None => defaults.baseline_version.clone(),
        };

        let allow_out_of_order = match mig_input.and_then(|m| m.allow_out_of_order) {
            Some(flag) => flag,
            None => match self.env_var(ENV_ALLOW_OUT_OF_ORDER) {
                Some(raw) => raw
                    .trim()
                    .to_lowercase()
                    .parse()
                    .with_context(|| format!("Invalid {}: {}", ENV_ALLOW_OUT_OF_ORDER, raw))?,
                None => defaults.allow_out_of_order,
            },
        };

        let statement_timeout = match mig_input.and_then(|m| m.statement_timeout.as_ref()) {
            Some(raw) => Some(
                parse_duration(raw).with_context(|| format!("Invalid statement timeout: {}", raw))?,
            ),
            None => defaults.statement_timeout,
        };

        let naming = MigrationNaming::new(
            mig_input
                .and_then(|m| m.script_prefix.as_deref())
                .unwrap_or(&defaults.naming.prefix),
            mig_input
                .and_then(|m| m.script_separator.as_deref())
                .unwrap_or(&defaults.naming.separator),
            mig_input
                .and_then(|m| m.script_suffix.as_deref())
                .unwrap_or(&defaults.naming.suffix),
        );

        Ok(Migration {
            locations: mig_input
                .and_then(|m| m.locations.as_ref())
                .cloned()
                .or_else(|| self.env_list(ENV_LOCATIONS))
                .unwrap_or_else(|| defaults.locations.clone()),
            table_prefix: mig_input
                .and_then(|m| m.table_prefix.as_ref())
                .cloned()
                .or_else(|| self.env_var(ENV_TABLE_PREFIX))
                .unwrap_or_else(|| defaults.table_prefix.clone()),
            target,
            baseline_version,
            baseline_description: mig_input
                .and_then(|m| m.baseline_description.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.baseline_description.clone()),
            allow_out_of_order,
            statement_timeout,
            naming,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
