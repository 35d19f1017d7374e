//! Applet package discovery.
//!
//! Every immediate subdirectory of the applet root is a package with a JSON
//! descriptor:
//!
//! ```text
//! applets/
//! ├── clock_applet/
//! │   ├── config.json      {"name": "Clock", "class_name": "ClockApplet", ...}
//! │   └── resources/       per-package asset cache
//! └── template_applet/     reserved, never listed
//! ```
//!
//! [`discover`] turns the packages into an immutable [`Catalog`] sorted by
//! name. A bad package is logged and skipped; discovery itself never fails.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{DESCRIPTOR_FILE, RESERVED_PACKAGES, RESOURCES_DIR};
use crate::error::DiscoveryError;

/// Opaque per-applet options passed through to the applet unchanged.
pub type Options = serde_json::Map<String, Value>;

// =============================================================================
// Manifest
// =============================================================================

/// Descriptor as stored on disk.
#[derive(Deserialize)]
struct Descriptor {
    name: String,
    class_name: String,
    #[serde(default = "default_description")]
    description: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default = "default_author")]
    author: String,
    #[serde(default)]
    options: Options,
    #[serde(default)]
    entry_point: Option<String>,
}

fn default_description() -> String { "No Description Provided".into() }

fn default_version() -> String { "No Version Provided".into() }

fn default_author() -> String { "No Author Provided".into() }

/// Immutable description of one applet package.
#[derive(Clone, PartialEq, Debug)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub options: Options,
    /// Exported type identifier resolved by the loader.
    pub class_name: String,
    /// Code unit that exports `class_name`. Defaults to the package directory name.
    pub entry_point: String,
    pub package_dir: PathBuf,
}

impl Manifest {
    /// Read and parse `<dir>/config.json`.
    pub fn from_package(dir: &Path) -> Result<Self, DiscoveryError> {
        let path = dir.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            return Err(DiscoveryError::MissingDescriptor(dir.to_path_buf()));
        }
        let raw = fs::read_to_string(&path).map_err(|source| DiscoveryError::Io {
            path: path.clone(),
            source,
        })?;
        let descriptor: Descriptor =
            serde_json::from_str(&raw).map_err(|source| DiscoveryError::Malformed { path, source })?;

        let entry_point = descriptor
            .entry_point
            .unwrap_or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());

        Ok(Self {
            name: descriptor.name,
            description: descriptor.description,
            version: descriptor.version,
            author: descriptor.author,
            options: descriptor.options,
            class_name: descriptor.class_name,
            entry_point,
            package_dir: dir.to_path_buf(),
        })
    }

    /// Directory the applet may use to cache generated or downloaded assets.
    pub fn resource_dir(&self) -> PathBuf { self.package_dir.join(RESOURCES_DIR) }

    /// Display value of one descriptive field, as rotated by the information viewer.
    pub fn field(
        &self,
        key: &str,
    ) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "description" => Some(&self.description),
            "version" => Some(&self.version),
            "author" => Some(&self.author),
            _ => None,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Manifests ordered by name. Index order is menu order.
#[derive(Clone, Default, Debug)]
pub struct Catalog {
    entries: Vec<Manifest>,
}

impl Catalog {
    /// Build a catalog; on duplicate names the later manifest wins.
    pub fn new(manifests: impl IntoIterator<Item = Manifest>) -> Self {
        let by_name: BTreeMap<String, Manifest> = manifests.into_iter().map(|m| (m.name.clone(), m)).collect();
        Self {
            entries: by_name.into_values().collect(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// True if no packages were found.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entry at menu position `index`.
    pub fn get(
        &self,
        index: usize,
    ) -> Option<&Manifest> {
        self.entries.get(index)
    }

    /// Entry named `name`.
    pub fn find(
        &self,
        name: &str,
    ) -> Option<&Manifest> {
        self.entries
            .binary_search_by(|m| m.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Entries in menu order.
    pub fn iter(&self) -> impl Iterator<Item = &Manifest> { self.entries.iter() }

    /// Up to `len` manifests starting at `start`, clamped to the catalog.
    pub fn slice(
        &self,
        start: usize,
        len: usize,
    ) -> &[Manifest] {
        let start = start.min(self.entries.len());
        let end = start.saturating_add(len).min(self.entries.len());
        &self.entries[start..end]
    }
}

// =============================================================================
// Discovery
// =============================================================================

fn is_candidate(dir: &Path) -> bool {
    let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    dir.is_dir() && !name.starts_with('.') && !RESERVED_PACKAGES.contains(&name)
}

/// Scan `root` for applet packages.
///
/// Reserved and hidden directories are skipped. Packages are visited in
/// directory-name order; if two declare the same name the later one wins.
pub fn discover(root: &Path) -> Catalog {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Cannot read applet root {}: {err}", root.display());
            return Catalog::default();
        }
    };

    let mut packages: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_candidate(path))
        .collect();
    packages.sort();

    let mut by_name = BTreeMap::new();
    for dir in packages {
        match Manifest::from_package(&dir) {
            Ok(manifest) => {
                debug!("Discovered applet '{}' in {}", manifest.name, dir.display());
                if let Some(previous) = by_name.insert(manifest.name.clone(), manifest) {
                    warn!(
                        "Applet name '{}' declared again, replacing {}",
                        previous.name,
                        previous.package_dir.display()
                    );
                }
            }
            Err(err) => warn!("Skipping applet package: {err}"),
        }
    }

    info!("Discovered {} applet(s) in {}", by_name.len(), root.display());
    Catalog {
        entries: by_name.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_package(
        root: &Path,
        dir: &str,
        descriptor: &str,
    ) {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(DESCRIPTOR_FILE), descriptor).unwrap();
    }

    // -------------------------------------------------------------------------
    // Descriptor Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_descriptor_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_package(&root, "weather", r#"{"name": "Weather", "class_name": "WeatherApplet"}"#);

        let manifest = Manifest::from_package(&root.join("weather")).unwrap();
        assert_eq!(manifest.description, "No Description Provided");
        assert_eq!(manifest.version, "No Version Provided");
        assert_eq!(manifest.author, "No Author Provided");
        assert!(manifest.options.is_empty());
        assert_eq!(manifest.entry_point, "weather", "Entry point defaults to the directory name");
        assert_eq!(manifest.resource_dir(), root.join("weather").join("resources"));
    }

    #[test]
    fn test_descriptor_full() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_package(
            &root,
            "stats",
            r#"{
                "name": "Stats",
                "class_name": "StatsApplet",
                "description": "Shows stats",
                "version": "1.2",
                "author": "someone",
                "entry_point": "template_applet",
                "options": {"refresh": 30, "team": "blue"}
            }"#,
        );

        let manifest = Manifest::from_package(&root.join("stats")).unwrap();
        assert_eq!(manifest.entry_point, "template_applet");
        assert_eq!(manifest.options.get("refresh"), Some(&Value::from(30)));
        assert_eq!(manifest.field("version"), Some("1.2"));
        assert_eq!(manifest.field("options"), None);
    }

    #[test]
    fn test_descriptor_errors() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("empty")).unwrap();
        write_package(&root, "broken", "{not json");
        write_package(&root, "nameless", r#"{"class_name": "X"}"#);

        assert!(matches!(
            Manifest::from_package(&root.join("empty")),
            Err(DiscoveryError::MissingDescriptor(_))
        ));
        assert!(matches!(
            Manifest::from_package(&root.join("broken")),
            Err(DiscoveryError::Malformed { .. })
        ));
        assert!(
            matches!(Manifest::from_package(&root.join("nameless")), Err(DiscoveryError::Malformed { .. })),
            "name is required"
        );
    }

    // -------------------------------------------------------------------------
    // Discovery Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_discover_sorts_and_skips() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_package(&root, "b_dir", r#"{"name": "Zebra", "class_name": "A"}"#);
        write_package(&root, "a_dir", r#"{"name": "Apple", "class_name": "A"}"#);
        write_package(&root, "bad", "[]");
        write_package(&root, "template_applet", r#"{"name": "Template", "class_name": "A"}"#);
        write_package(&root, ".hidden", r#"{"name": "Hidden", "class_name": "A"}"#);
        fs::write(root.join("stray.txt"), "not a package").unwrap();

        let catalog = discover(&root);
        let names: Vec<_> = catalog.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra"]);
        assert!(catalog.find("Template").is_none(), "Reserved packages are excluded");
        assert_eq!(catalog.find("Zebra").map(|m| m.entry_point.as_str()), Some("b_dir"));
    }

    #[test]
    fn test_discover_last_write_wins() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_package(&root, "first", r#"{"name": "Same", "class_name": "A", "version": "1"}"#);
        write_package(&root, "second", r#"{"name": "Same", "class_name": "A", "version": "2"}"#);

        let catalog = discover(&root);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).map(|m| m.version.as_str()), Some("2"));
    }

    #[test]
    fn test_discover_is_idempotent_and_sees_new_packages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_package(&root, "one", r#"{"name": "One", "class_name": "A"}"#);
        assert_eq!(discover(&root).len(), 1);
        assert_eq!(discover(&root).len(), 1);

        write_package(&root, "two", r#"{"name": "Two", "class_name": "A"}"#);
        assert_eq!(discover(&root).len(), 2, "Rediscovery picks up new packages");
    }

    #[test]
    fn test_discover_missing_root() {
        let catalog = discover(Path::new("/nonexistent/matrix-applets-root"));
        assert!(catalog.is_empty());
    }

    // -------------------------------------------------------------------------
    // Catalog Tests
    // -------------------------------------------------------------------------

    fn manifest(name: &str) -> Manifest {
        Manifest {
            name: name.into(),
            description: String::new(),
            version: String::new(),
            author: String::new(),
            options: Options::new(),
            class_name: "A".into(),
            entry_point: "a".into(),
            package_dir: PathBuf::from(name),
        }
    }

    #[test]
    fn test_catalog_orders_by_name() {
        let catalog = Catalog::new(["c", "a", "b"].map(manifest));
        let names: Vec<_> = catalog.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(catalog.find("b").map(|m| m.name.as_str()), Some("b"));
        assert!(catalog.find("d").is_none());
    }

    #[test]
    fn test_catalog_slice_clamps() {
        let catalog = Catalog::new(["a", "b", "c", "d", "e"].map(manifest));
        assert_eq!(catalog.slice(4, 2).len(), 1);
        assert_eq!(catalog.slice(2, 2)[0].name, "c");
        assert!(catalog.slice(9, 2).is_empty());
    }
}
