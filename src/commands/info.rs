use crate::commands::context::CommandContext;
use crate::commands::initialize::Initialize;
use crate::config::Config;
use crate::db::SchemaVersionDao;
use crate::error::Result;
use crate::info::{MigrationInfoService, dump_to_ascii_table};
use crate::migration::MigrationVersion;
use crate::resolver::MigrationResolver;

/// Renders the state of every known migration as a table
pub struct Info<'a> {
    resolver: &'a dyn MigrationResolver,
    dao: &'a dyn SchemaVersionDao,
    target: MigrationVersion,
}

impl<'a> Info<'a> {
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

    pub async fn run(&self) -> Result<String> {
        Initialize::new(self.dao).run().await?;
        let mut service =
            MigrationInfoService::new(self.resolver, self.dao, self.target.clone(), false, true);
        service.refresh().await?;
        Ok(dump_to_ascii_table(service.all()))
    }
}

pub async fn cmd_info(config: &Config) -> anyhow::Result<()> {
    let ctx = CommandContext::connect(config).await?;

    let table = Info::new(&ctx.resolver, &ctx.dao)
        .target(config.migration.target.clone())
        .run()
        .await?;
    print!("{}", table);
    Ok(())
}
