use crate::error::{MigrationError, Result};
use crate::migration::MigrationVersion;

/// How migration names are laid out: `<prefix><version><separator><description><suffix>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationNaming {
    pub prefix: String,
    pub separator: String,
    pub suffix: String,
}

impl MigrationNaming {
    pub fn new(prefix: &str, separator: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            separator: separator.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// Naming used for code migrations, which have no file suffix
    pub fn code() -> Self {
        Self::new("V", "__", "")
    }

    pub fn matches(&self, name: &str) -> bool {
        name.len() >= self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }

    pub fn example(&self) -> String {
        format!("{}1_2{}Description{}", self.prefix, self.separator, self.suffix)
    }

    pub fn extract(&self, name: &str) -> Result<(MigrationVersion, String)> {
        extract_version_and_description(name, &self.prefix, &self.separator, &self.suffix)
    }
}

impl Default for MigrationNaming {
    fn default() -> Self {
        Self::new("V", "__", ".cql")
    }
}

/// Split a migration name into its version and description.
///
/// Underscores in the description become spaces: `V1_2__Add_users.cql`
/// yields version `1.2` and description `Add users`.
pub fn extract_version_and_description(
    name: &str,
    prefix: &str,
    separator: &str,
    suffix: &str,
) -> Result<(MigrationVersion, String)> {
    let invalid = || MigrationError::InvalidMigrationName {
        name: name.to_string(),
        example: format!("{}1_2{}Description{}", prefix, separator, suffix),
    };

    let clean = name
        .strip_prefix(prefix)
        .and_then(|n| n.strip_suffix(suffix))
        .ok_or_else(invalid)?;

    let (version, description) = clean.split_once(separator).ok_or_else(invalid)?;

    Ok((
        MigrationVersion::parse(version)?,
        description.replace('_', " "),
    ))
}
