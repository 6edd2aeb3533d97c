use anyhow::{Context, Result, bail};
use glob::Pattern;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const FILESYSTEM_PREFIX: &str = "filesystem:";
const CLASSPATH_PREFIX: &str = "classpath:";

/// A directory that migration scripts are discovered in.
///
/// Descriptors may carry a `filesystem:` prefix; bare paths are filesystem
/// paths. Backslashes are normalized and a trailing slash is dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptsLocation {
    path: String,
}

impl ScriptsLocation {
    pub fn new(descriptor: &str) -> Result<Self> {
        let normalized = descriptor.trim().replace('\\', "/");

        if normalized.starts_with(CLASSPATH_PREFIX) {
            bail!(
                "Unsupported location '{}': only {} locations can be scanned",
                normalized,
                FILESYSTEM_PREFIX
            );
        }

        let mut path = normalized
            .strip_prefix(FILESYSTEM_PREFIX)
            .unwrap_or(&normalized)
            .to_string();
        while path.len() > 1 && path.ends_with('/') {
            path.pop();
        }

        if path.is_empty() {
            bail!("Empty migration location '{}'", descriptor);
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn descriptor(&self) -> String {
        format!("{}{}", FILESYSTEM_PREFIX, self.path)
    }

    pub fn is_parent_of(&self, other: &ScriptsLocation) -> bool {
        format!("{}/", other.path).starts_with(&format!("{}/", self.path))
    }

    /// Find every file under this location whose name starts with `prefix`
    /// and ends with `suffix`, ordered by relative path.
    pub fn scan(&self, prefix: &str, suffix: &str) -> Result<Vec<Resource>> {
        let root = Path::new(&self.path);
        if !root.is_dir() {
            warn!("Unable to resolve location {}", self.descriptor());
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/**/{}*{}",
            Pattern::escape(&self.path),
            Pattern::escape(prefix),
            Pattern::escape(suffix)
        );
        debug!("Scanning for migrations with pattern {}", pattern);

        let mut resources = Vec::new();
        for entry in glob::glob(&pattern).with_context(|| format!("Invalid scan pattern {}", pattern))? {
            let path = entry.with_context(|| format!("Unable to scan {}", self.descriptor()))?;
            if !path.is_file() {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            resources.push(Resource {
                location: relative,
                location_on_disk: path,
            });
        }

        resources.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(resources)
    }
}

impl fmt::Display for ScriptsLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// The configured set of locations, with duplicates and nested locations removed
#[derive(Debug, Clone, Default)]
pub struct ScriptsLocations {
    locations: Vec<ScriptsLocation>,
}

impl ScriptsLocations {
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Result<Self> {
        let mut parsed = raw
            .iter()
            .map(|r| ScriptsLocation::new(r.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        parsed.sort();

        let mut locations: Vec<ScriptsLocation> = Vec::new();
        for location in parsed {
            if locations.contains(&location) {
                warn!("Discarding duplicate location '{}'", location);
                continue;
            }
            if let Some(parent) = locations.iter().find(|l| l.is_parent_of(&location)) {
                warn!(
                    "Discarding location '{}' as it is a sub-location of '{}'",
                    location, parent
                );
                continue;
            }
            locations.push(location);
        }

        Ok(Self { locations })
    }

    pub fn locations(&self) -> &[ScriptsLocation] {
        &self.locations
    }
}

/// A discovered script file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Path relative to the scanned location, `/`-separated
    pub location: String,
    pub location_on_disk: PathBuf,
}

impl Resource {
    pub fn filename(&self) -> &str {
        self.location.rsplit('/').next().unwrap_or(&self.location)
    }

    pub fn load_as_string(&self) -> Result<String> {
        std::fs::read_to_string(&self.location_on_disk)
            .with_context(|| format!("Unable to read {}", self.location_on_disk.display()))
    }
}
