use console::style;
use std::time::Duration;

/// Human-facing progress lines printed while migrations run
pub struct MigrationReporter {
    enabled: bool,
    applied: usize,
}

impl MigrationReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            applied: 0,
        }
    }

    /// A reporter that prints nothing, for library use and tests
    pub fn silent() -> Self {
        Self::new(false)
    }

    pub fn start_migration(&self, version: &str, description: &str, out_of_order: bool) {
        if !self.enabled {
            return;
        }
        let suffix = if out_of_order {
            format!(" {}", style("(out of order)").yellow())
        } else {
            String::new()
        };
        println!("  {} {} - {}{}", style("→").cyan(), version, description, suffix);
    }

    pub fn complete_migration(&mut self, version: &str, duration: Duration) {
        self.applied += 1;
        if self.enabled {
            println!(
                "  {} {} ({})",
                style("✓").green(),
                version,
                style(format_duration(duration)).dim()
            );
        }
    }

    pub fn fail_migration(&self, version: &str, error: &anyhow::Error) {
        if self.enabled {
            println!(
                "  {} {} failed: {}",
                style("✗").red(),
                version,
                style(error.to_string()).red()
            );
        }
    }

    pub fn warn(&self, message: &str) {
        if self.enabled {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn migration_summary(&self, keyspace: &str, total_duration: Duration) {
        if !self.enabled {
            return;
        }
        if self.applied == 0 {
            println!(
                "{} Keyspace {} is up to date",
                style("✓").green(),
                keyspace
            );
        } else {
            println!(
                "{} Applied {} migration{} to {} in {}",
                style("✓").green(),
                self.applied,
                if self.applied == 1 { "" } else { "s" },
                keyspace,
                style(format_duration(total_duration)).green()
            );
        }
    }

    pub fn applied(&self) -> usize {
        self.applied
    }
}

pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let millis = d.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{}s", total_secs, millis / 100)
        } else {
            format!("{}s", total_secs)
        }
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m{}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h{}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}
