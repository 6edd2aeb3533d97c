use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            cluster: match (self.cluster, other.cluster) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => a.merge(b),
            },
            keyspace: match (self.keyspace, other.keyspace) {
                (Some(a), Some(b)) => Some(KeyspaceInput {
                    name: a.name.merge(b.name),
                }),
                (a, b) => a.merge(b),
            },
            migration: match (self.migration, other.migration) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => a.merge(b),
            },
        }
    }
}

// Field-by-field merges for sections that several sources contribute to
impl ClusterInput {
    pub fn merge_with(self, other: ClusterInput) -> ClusterInput {
        ClusterInput {
            contact_points: other.contact_points.or(self.contact_points),
            port: other.port.or(self.port),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
        }
    }
}

impl MigrationInput {
    pub fn merge_with(self, other: MigrationInput) -> MigrationInput {
        MigrationInput {
            locations: other.locations.or(self.locations),
            table_prefix: other.table_prefix.or(self.table_prefix),
            target: other.target.or(self.target),
            baseline_version: other.baseline_version.or(self.baseline_version),
            baseline_description: other.baseline_description.or(self.baseline_description),
            allow_out_of_order: other.allow_out_of_order.or(self.allow_out_of_order),
            statement_timeout: other.statement_timeout.or(self.statement_timeout),
            script_prefix: other.script_prefix.or(self.script_prefix),
            script_separator: other.script_separator.or(self.script_separator),
            script_suffix: other.script_suffix.or(self.script_suffix),
        }
    }
}
