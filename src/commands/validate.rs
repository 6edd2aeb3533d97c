use crate::commands::context::CommandContext;
use crate::commands::initialize::Initialize;
use crate::config::Config;
use crate::db::SchemaVersionDao;
use crate::error::{MigrationError, Result};
use crate::info::MigrationInfoService;
use crate::migration::MigrationVersion;
use crate::progress::format_duration;
use crate::resolver::MigrationResolver;
use std::time::Instant;
use tracing::info;

/// Checks resolved migrations against the ledger without applying anything
pub struct Validate<'a> {
    resolver: &'a dyn MigrationResolver,
    dao: &'a dyn SchemaVersionDao,
    target: MigrationVersion,
}

impl<'a> Validate<'a> {
    pub fn new(resolver: &'a dyn MigrationResolver, dao: &'a dyn SchemaVersionDao) -> Self {
        Self {
            resolver,
            dao,
            target: MigrationVersion::Latest,
        }
    }

    pub fn target(mut self, target: MigrationVersion) -> Self {
        self.target = target;
        self
    }

    /// The first validation problem, if any
    pub async fn run(&self) -> Result<Option<String>> {
        let started = Instant::now();
        Initialize::new(self.dao).run().await?;

        let mut service =
            MigrationInfoService::new(self.resolver, self.dao, self.target.clone(), true, false);
        service.refresh().await?;

        let count = service.all().len();
        let validation_error = service.validate();

        info!(
            "Validated {} migrations (execution time {})",
            count,
            format_duration(started.elapsed())
        );
        Ok(validation_error)
    }

    /// Like [`run`](Self::run), but a validation problem becomes an error
    pub async fn run_strict(&self) -> Result<()> {
        match self.run().await? {
            Some(message) => Err(MigrationError::ValidationFailed(message)),
            None => Ok(()),
        }
    }
}

pub async fn cmd_validate(config: &Config) -> anyhow::Result<()> {
    let ctx = CommandContext::connect(config).await?;

    Validate::new(&ctx.resolver, &ctx.dao)
        .target(config.migration.target.clone())
        .run_strict()
        .await?;
    println!("{} Keyspace {} is valid", console::style("✓").green(), ctx.keyspace);
    Ok(())
}
