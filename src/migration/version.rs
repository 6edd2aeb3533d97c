use crate::error::{MigrationError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Version of a migration, e.g. `1`, `1.1`, `2016_08_01`.
///
/// Concrete versions are a sequence of arbitrary-precision non-negative
/// integers. Trailing zero components do not take part in equality or
/// ordering, so `1`, `1.0` and `001.00` are the same version.
///
/// Three sentinels live outside the numeric order: [`MigrationVersion::Empty`]
/// sorts below everything, [`MigrationVersion::Latest`] above everything, and
/// [`MigrationVersion::Current`] is a placeholder that must be resolved to a
/// concrete version before it is compared against one. For a total order it
/// sits between `Empty` and the concrete versions.
#[derive(Debug, Clone)]
pub enum MigrationVersion {
    Empty,
    Current,
    Latest,
    Concrete {
        /// Decimal digits of each component with leading zeros removed
        parts: Vec<String>,
        /// Input text with `_` normalized to `.`
        display: String,
    },
}

const EMPTY_DISPLAY: &str = "<< Empty Schema >>";
const CURRENT_DISPLAY: &str = "<< Current Version >>";
const LATEST_DISPLAY: &str = "<< Latest Version >>";

impl MigrationVersion {
    /// Parse a concrete version. Sentinels are not recognised here, see
    /// [`MigrationVersion::from_version`].
    pub fn parse(version: &str) -> Result<Self> {
        let display = version.replace('_', ".");
        let parts = tokenize(&display).ok_or_else(|| MigrationError::InvalidVersionFormat {
            version: version.to_string(),
        })?;

        Ok(Self::Concrete { parts, display })
    }

    /// Parse a version as stored in configuration or in the ledger.
    ///
    /// `None` is the empty schema, `current` (any case) is the current-version
    /// placeholder and the latest sentinel's storage string is `Latest`.
    pub fn from_version(version: Option<&str>) -> Result<Self> {
        match version {
            None => Ok(Self::Empty),
            Some(v) if v.eq_ignore_ascii_case("current") => Ok(Self::Current),
            Some(v) if v.eq_ignore_ascii_case("latest") => Ok(Self::Latest),
            Some(v) if v == latest_version_string() => Ok(Self::Latest),
            Some(v) => Self::parse(v),
        }
    }

    /// String form used when persisting the version; `None` for the empty schema
    pub fn version_string(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Latest => Some(latest_version_string()),
            Self::Current => Some(CURRENT_DISPLAY.to_string()),
            Self::Concrete { display, .. } => Some(display.clone()),
        }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Concrete { .. })
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Current => 1,
            Self::Concrete { .. } => 2,
            Self::Latest => 3,
        }
    }
}

fn latest_version_string() -> String {
    i64::MAX.to_string()
}

/// Split a normalized version into numeric components, dropping trailing zero
/// components except the first. Returns `None` on any malformed segment.
fn tokenize(normalized: &str) -> Option<Vec<String>> {
    let mut parts = normalized
        .split('.')
        .map(|segment| {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let trimmed = segment.trim_start_matches('0');
            Some(if trimmed.is_empty() {
                "0".to_string()
            } else {
                trimmed.to_string()
            })
        })
        .collect::<Option<Vec<_>>>()?;

    while parts.len() > 1 && parts.last().is_some_and(|p| p == "0") {
        parts.pop();
    }

    Some(parts)
}

/// Compare two canonical decimal strings numerically
fn compare_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_parts(a: &[String], b: &[String]) -> Ordering {
    let longest = a.len().max(b.len());
    for i in 0..longest {
        let left = a.get(i).map(String::as_str).unwrap_or("0");
        let right = b.get(i).map(String::as_str).unwrap_or("0");
        match compare_numeric(left, right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Concrete { parts: a, .. }, Self::Concrete { parts: b, .. }) => {
                compare_parts(a, b)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MigrationVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MigrationVersion {}

impl Hash for MigrationVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        if let Self::Concrete { parts, .. } = self {
            parts.hash(state);
        }
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str(EMPTY_DISPLAY),
            Self::Current => f.write_str(CURRENT_DISPLAY),
            Self::Latest => f.write_str(LATEST_DISPLAY),
            Self::Concrete { display, .. } => f.write_str(display),
        }
    }
}

impl FromStr for MigrationVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_version(Some(s))
    }
}
