use crate::info::record::MigrationRecord;

const VERSION_TITLE: &str = "Version";
const DESCRIPTION_TITLE: &str = "Description";
const INSTALLED_ON_WIDTH: usize = 19;
const STATE_WIDTH: usize = 7;

/// Render records as the `info` table
pub fn dump_to_ascii_table(records: &[MigrationRecord]) -> String {
    let version_width = records
        .iter()
        .map(|r| r.version().to_string().chars().count())
        .fold(VERSION_TITLE.len(), usize::max);
    let description_width = records
        .iter()
        .map(|r| r.description().chars().count())
        .fold(DESCRIPTION_TITLE.len(), usize::max);

    let ruler = format!(
        "+-{}-+-{}-+---------------------+---------+\n",
        "-".repeat(version_width),
        "-".repeat(description_width)
    );

    let mut table = String::new();
    table.push_str(&ruler);
    table.push_str(&format!(
        "| {} | {} | Installed on        | State   |\n",
        trim_or_pad(VERSION_TITLE, version_width),
        trim_or_pad(DESCRIPTION_TITLE, description_width)
    ));
    table.push_str(&ruler);

    if records.is_empty() {
        table.push_str(&trim_or_pad("| No migrations found", ruler.len() - 2));
        table.push_str("|\n");
    }

    for record in records {
        let installed_on = record
            .installed_on()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            trim_or_pad(&record.version().to_string(), version_width),
            trim_or_pad(record.description(), description_width),
            trim_or_pad(&installed_on, INSTALLED_ON_WIDTH),
            trim_or_pad(record.state().display_name(), STATE_WIDTH)
        ));
    }

    table.push_str(&ruler);
    table
}

/// Cut to `width` characters, or right-pad with spaces up to it
fn trim_or_pad(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CqlSession;
    use crate::info::service::merge_resolved_and_applied;
    use crate::migration::{
        AppliedMigration, MigrationExecutor, MigrationType, MigrationVersion, ResolvedMigration,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;
    use std::sync::Arc;

    struct Noop;

    #[async_trait]
    impl MigrationExecutor for Noop {
        async fn execute(&self, _session: &dyn CqlSession) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn resolved(version: &str, description: &str) -> ResolvedMigration {
        ResolvedMigration {
            version: Some(MigrationVersion::parse(version).unwrap()),
            description: description.to_string(),
            script: format!("V{}.cql", version),
            checksum: Some(1),
            migration_type: MigrationType::Cql,
            physical_location: format!("db/migration/V{}.cql", version),
            executor: Arc::new(Noop),
        }
    }

    fn applied(version: &str, description: &str, rank: i32) -> AppliedMigration {
        let mut row = AppliedMigration::new(
            MigrationVersion::parse(version).unwrap(),
            description,
            MigrationType::Cql,
            &format!("V{}.cql", version),
            Some(1),
            "",
            3,
            true,
        );
        row.version_rank = rank;
        row.installed_rank = rank;
        row
    }

    #[test]
    fn test_trim_or_pad() {
        assert_eq!(trim_or_pad("abc", 5), "abc  ");
        assert_eq!(trim_or_pad("abcdef", 3), "abc");
        assert_eq!(trim_or_pad("", 2), "  ");
    }

    #[test]
    fn test_dump_empty() {
        assert_snapshot!(dump_to_ascii_table(&[]), @r"
        +---------+-------------+---------------------+---------+
        | Version | Description | Installed on        | State   |
        +---------+-------------+---------------------+---------+
        | No migrations found                                   |
        +---------+-------------+---------------------+---------+
        ");
    }

    #[test]
    fn test_dump_mixed_states() {
        let mut first = applied("1", "Create users", 1);
        first.installed_on = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());

        let records = merge_resolved_and_applied(
            vec![resolved("1", "Create users"), resolved("1.1", "Add email")],
            vec![first, applied("2", "Seed reference data", 2)],
            &MigrationVersion::Latest,
            true,
            true,
        );

        assert_snapshot!(dump_to_ascii_table(&records), @r"
        +---------+---------------------+---------------------+---------+
        | Version | Description         | Installed on        | State   |
        +---------+---------------------+---------------------+---------+
        | 1       | Create users        | 2024-01-02 03:04:05 | Success |
        | 1.1     | Add email           |                     | Pending |
        | 2       | Seed reference data |                     | Future  |
        +---------+---------------------+---------------------+---------+
        ");
    }
}
