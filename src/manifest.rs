use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("couldn't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse package.json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Dependency tables of a `package.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Dependencies,
        Section::DevDependencies,
        Section::PeerDependencies,
        Section::OptionalDependencies,
    ];
}

/// Only the dependency tables; versions are kept as raw values since
/// we never interpret the constraints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, Value>,
}

impl PackageJson {
    fn section(&self, section: Section) -> &BTreeMap<String, Value> {
        match section {
            Section::Dependencies => &self.dependencies,
            Section::DevDependencies => &self.dev_dependencies,
            Section::PeerDependencies => &self.peer_dependencies,
            Section::OptionalDependencies => &self.optional_dependencies,
        }
    }
}

/// Unique dependency names declared across `sections` of a `package.json`.
///
/// A manifest without dependencies yields an empty set; a table that is not a
/// JSON object fails the whole read.
pub fn dependency_names(
    bytes: &[u8],
    sections: &[Section],
) -> Result<BTreeSet<String>, ManifestError> {
    let manifest: PackageJson = serde_json::from_slice(bytes)?;

    let names: BTreeSet<String> = sections
        .iter()
        .flat_map(|s| manifest.section(*s).keys())
        .filter(|name| !name.is_empty())
        .cloned()
        .collect();

    if names.is_empty() {
        debug!("no dependencies declared in package.json");
    }
    Ok(names)
}

/// Read dependency names from a `package.json`, or from the one inside `path`
/// when it is a directory.
pub fn read(path: &Path, sections: &[Section]) -> Result<BTreeSet<String>, ManifestError> {
    let file = if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else {
        path.to_path_buf()
    };

    let bytes = std::fs::read(&file).map_err(|source| ManifestError::Io {
        path: file.clone(),
        source,
    })?;
    dependency_names(&bytes, sections)
}
