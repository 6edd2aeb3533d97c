//! Discovery of migrations from scripts and registered code
pub mod code;
pub mod cql;
pub mod location;

pub use code::{CodeMigration, CodeMigrationResolver};
pub use cql::{CqlMigrationResolver, calculate_checksum};
pub use location::{Resource, ScriptsLocation, ScriptsLocations};

use crate::error::{MigrationError, Result};
use crate::migration::{MigrationNaming, ResolvedMigration};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::debug;

/// A source of migration candidates
pub trait MigrationResolver: Send + Sync {
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>>;
}

/// Fans out to one CQL resolver per location plus any extra resolvers, and
/// caches the merged, validated result for the lifetime of the resolver.
pub struct CompositeMigrationResolver {
    resolvers: Vec<Box<dyn MigrationResolver>>,
    cache: OnceCell<Vec<ResolvedMigration>>,
}

impl CompositeMigrationResolver {
    pub fn new(
        locations: &ScriptsLocations,
        naming: &MigrationNaming,
        statement_timeout: Option<Duration>,
        custom_resolvers: Vec<Box<dyn MigrationResolver>>,
    ) -> Self {
        let mut resolvers: Vec<Box<dyn MigrationResolver>> = locations
            .locations()
            .iter()
            .map(|location| {
                Box::new(CqlMigrationResolver::new(
                    location.clone(),
                    naming.clone(),
                    statement_timeout,
                )) as Box<dyn MigrationResolver>
            })
            .collect();
        resolvers.extend(custom_resolvers);

        Self::from_resolvers(resolvers)
    }

    pub fn from_resolvers(resolvers: Vec<Box<dyn MigrationResolver>>) -> Self {
        Self {
            resolvers,
            cache: OnceCell::new(),
        }
    }

    fn collect_migrations(&self) -> Result<Vec<ResolvedMigration>> {
        let mut migrations: Vec<ResolvedMigration> = Vec::new();
        for resolver in &self.resolvers {
            for migration in resolver.resolve_migrations()? {
                if !migrations.contains(&migration) {
                    migrations.push(migration);
                }
            }
        }

        migrations.sort_by(|a, b| a.resolution_order(b));
        check_for_incompatibilities(&migrations)?;

        debug!("Resolved {} migrations", migrations.len());
        Ok(migrations)
    }
}

impl MigrationResolver for CompositeMigrationResolver {
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>> {
        self.cache
            .get_or_try_init(|| self.collect_migrations())
            .cloned()
    }
}

/// Fail on two distinct migrations sharing a version. Expects sorted input.
pub fn check_for_incompatibilities(migrations: &[ResolvedMigration]) -> Result<()> {
    for pair in migrations.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if let (Some(a), Some(b)) = (&current.version, &next.version)
            && a == b
        {
            return Err(MigrationError::DuplicateVersion {
                version: a.to_string(),
                first_location: current.physical_location.clone(),
                first_type: current.migration_type,
                second_location: next.physical_location.clone(),
                second_type: next.migration_type,
            });
        }
    }
    Ok(())
}
