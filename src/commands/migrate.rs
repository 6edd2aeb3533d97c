use crate::commands::context::CommandContext;
use crate::commands::initialize::Initialize;
use crate::config::Config;
use crate::db::{CqlSession, SchemaVersionDao};
use crate::error::{MigrationError, Result};
use crate::info::{MigrationInfoService, MigrationRecord};
use crate::migration::{AppliedMigration, MigrationState, MigrationVersion};
use crate::progress::{MigrationReporter, format_duration};
use crate::resolver::MigrationResolver;
use anyhow::anyhow;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Applies pending migrations one at a time until none are left
pub struct Migrate<'a> {
    resolver: &'a dyn MigrationResolver,
    dao: &'a dyn SchemaVersionDao,
    session: &'a dyn CqlSession,
    target: MigrationVersion,
    allow_out_of_order: bool,
    installed_by: String,
    reporter: MigrationReporter,
    shutdown: CancellationToken,
}

impl<'a> Migrate<'a> {
    pub fn new(
        resolver: &'a dyn MigrationResolver,
        dao: &'a dyn SchemaVersionDao,
        session: &'a dyn CqlSession,
    ) -> Self {
        Self {
            resolver,
            dao,
            session,
            target: MigrationVersion::Latest,
            allow_out_of_order: false,
            installed_by: String::new(),
            reporter: MigrationReporter::silent(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn target(mut self, target: MigrationVersion) -> Self {
        self.target = target;
        self
    }

    pub fn allow_out_of_order(mut self, allow: bool) -> Self {
        self.allow_out_of_order = allow;
        self
    }

    pub fn installed_by(mut self, user: &str) -> Self {
        self.installed_by = user.to_string();
        self
    }

    pub fn reporter(mut self, reporter: MigrationReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stop before the next migration once `token` is cancelled. A migration
    /// already executing always runs to completion and is recorded.
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Returns the number of migrations applied; zero means up to date
    pub async fn run(mut self) -> Result<u32> {
        let started = Instant::now();
        let keyspace = self.dao.keyspace().to_string();

        Initialize::new(self.dao).run().await?;

        let mut applied_count = 0u32;
        loop {
            let mut info = MigrationInfoService::new(
                self.resolver,
                self.dao,
                self.target.clone(),
                self.allow_out_of_order,
                true,
            );
            info.refresh().await?;

            let current = info
                .current()
                .map(|r| r.version().clone())
                .unwrap_or(MigrationVersion::Empty);

            if applied_count == 0 {
                info!("Current version of keyspace {}: {}", keyspace, current);
                if self.allow_out_of_order {
                    warn!(
                        "'outOfOrder' mode is active. Migration of keyspace {} may not be reproducible.",
                        keyspace
                    );
                }
            }

            if !info.future().is_empty() {
                let message = match info.resolved().last() {
                    None => format!(
                        "Keyspace {} has version {}, but no migration could be resolved in the configured locations!",
                        keyspace, current
                    ),
                    Some(latest) => format!(
                        "Keyspace {} has version {} that is newer than the latest available migration ({})!",
                        keyspace,
                        current,
                        latest.version()
                    ),
                };
                warn!("{}", message);
                self.reporter.warn(&message);
            }

            let failed = info.failed();
            if let Some(first) = failed.first() {
                if failed.len() == 1 && first.state() == MigrationState::FutureFailed {
                    let message = format!(
                        "Keyspace {} contains a failed future migration to version {}!",
                        keyspace,
                        first.version()
                    );
                    warn!("{}", message);
                    self.reporter.warn(&message);
                } else {
                    return Err(MigrationError::FailedMigrationPresent {
                        keyspace,
                        version: first.version().clone(),
                    });
                }
            }

            let Some(next) = info.pending().first().map(|r| (*r).clone()) else {
                break;
            };

            if self.shutdown.is_cancelled() {
                warn!(
                    "Stopping migration of keyspace {} before version {}",
                    keyspace,
                    next.version()
                );
                return Err(MigrationError::Interrupted {
                    keyspace,
                    applied: applied_count,
                });
            }

            let out_of_order = *next.version() < current;
            self.apply_migration(&keyspace, &next, out_of_order).await?;
            applied_count += 1;
        }

        log_summary(&keyspace, applied_count, started.elapsed());
        self.reporter.migration_summary(&keyspace, started.elapsed());
        Ok(applied_count)
    }

    async fn apply_migration(
        &mut self,
        keyspace: &str,
        record: &MigrationRecord,
        out_of_order: bool,
    ) -> Result<()> {
        let version = record.version().clone();
        let resolved = record.resolved().ok_or_else(|| {
            MigrationError::Execution(anyhow!("Pending migration {} has no resolved source", version))
        })?;
        let log_message = format!("Migration of keyspace {} to version {}", keyspace, version);

        info!(
            "{} - {}{}",
            log_message,
            resolved.description,
            if out_of_order { " (out of order)" } else { "" }
        );
        self.reporter
            .start_migration(&version.to_string(), &resolved.description, out_of_order);

        let started = Instant::now();
        let outcome = resolved.executor.execute(self.session).await;
        let elapsed = started.elapsed();
        let execution_time = i32::try_from(elapsed.as_millis()).unwrap_or(i32::MAX);

        self.dao
            .add_applied_migration(AppliedMigration::new(
                version.clone(),
                &resolved.description,
                resolved.migration_type,
                &resolved.script,
                resolved.checksum,
                &self.installed_by,
                execution_time,
                outcome.is_ok(),
            ))
            .await?;

        match outcome {
            Ok(()) => {
                debug!("{} success!", log_message);
                self.reporter
                    .complete_migration(&version.to_string(), elapsed);
                Ok(())
            }
            Err(source) => {
                error!(
                    "{} failed! Please restore backups and roll back database and code!",
                    log_message
                );
                self.reporter.fail_migration(&version.to_string(), &source);
                Err(MigrationError::MigrationFailed {
                    version,
                    description: resolved.description.clone(),
                    source,
                })
            }
        }
    }
}

fn log_summary(keyspace: &str, count: u32, elapsed: Duration) {
    if count == 0 {
        info!("Keyspace {} is up to date, no migration necessary", keyspace);
    } else {
        info!(
            "Successfully applied {} migration(s) to keyspace {} (execution time {})",
            count,
            keyspace,
            format_duration(elapsed)
        );
    }
}

pub async fn cmd_migrate(
    config: &Config,
    show_progress: bool,
    shutdown: CancellationToken,
) -> anyhow::Result<u32> {
    let ctx = CommandContext::connect(config).await?;

    let count = Migrate::new(&ctx.resolver, &ctx.dao, &ctx.session)
        .target(config.migration.target.clone())
        .allow_out_of_order(config.migration.allow_out_of_order)
        .installed_by(&ctx.user)
        .reporter(MigrationReporter::new(show_progress))
        .shutdown(shutdown)
        .run()
        .await?;
    Ok(count)
}
