//! Controller discovery from a directory layout
//!
//! Every `*.toml` file under the controllers directory declares one
//! controller. The file stem is the controller name, and a sibling directory
//! with the same stem holds that controller's children:
//!
//! ```text
//! controllers/
//! ├── posts.toml              role = "collection"
//! └── posts/
//!     ├── comments.toml       role = "nested"
//!     └── delete_confirmation.toml
//! ```
//!
//! Siblings are visited in file-name order, so discovery is deterministic.
//! Hidden files and directories are ignored.

use crate::action::Action;
use crate::decl::ControllerDecl;
use crate::error::DiscoveryError;
use crate::role::Role;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Manifest file extension
const MANIFEST_EXTENSION: &str = "toml";

/// Contents of one controller manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerManifest {
    /// Controller name, defaulting to the file stem
    #[serde(default)]
    pub name: Option<String>,
    /// Role of the controller
    pub role: Role,
    /// Explicit resource identifier
    #[serde(default)]
    pub resource: Option<String>,
    /// Explicit parent resource identifier
    #[serde(default)]
    pub parent: Option<String>,
    /// Replacement for the role defaults
    #[serde(default)]
    pub only: Option<Vec<Action>>,
    /// Actions removed
    #[serde(default)]
    pub except: Vec<Action>,
    /// Actions added
    #[serde(default)]
    pub widen: Vec<Action>,
}

impl ControllerManifest {
    fn into_decl(self, stem: &str) -> ControllerDecl {
        ControllerDecl {
            name: self.name.unwrap_or_else(|| stem.to_string()),
            role: self.role,
            resource: self.resource,
            parent: self.parent,
            only: self.only,
            except: self.except,
            widen: self.widen,
            children: Vec::new(),
        }
    }
}

/// Discover controller declarations under `root`
///
/// # Errors
///
/// Returns an error if the directory cannot be walked, a manifest cannot be
/// read or parsed, or a directory holding manifests has no parent manifest.
///
/// # Example
///
/// ```rust,no_run
/// use acton_resources::{discovery, RoutingTree};
///
/// # fn example() -> anyhow::Result<()> {
/// let decls = discovery::discover("./controllers")?;
/// let table = RoutingTree::build(decls)?.generate()?;
/// # Ok(())
/// # }
/// ```
pub fn discover(root: impl AsRef<Path>) -> Result<Vec<ControllerDecl>, DiscoveryError> {
    let root = root.as_ref();
    let decls = discover_level(root)?;
    tracing::debug!(
        root = %root.display(),
        controllers = decls.len(),
        "Discovered top-level controllers"
    );
    Ok(decls)
}

fn discover_level(dir: &Path) -> Result<Vec<ControllerDecl>, DiscoveryError> {
    let mut manifests: Vec<(String, PathBuf)> = Vec::new();
    let mut directories: BTreeMap<String, PathBuf> = BTreeMap::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker.into_iter().filter_entry(|entry| !is_hidden(entry)) {
        let entry = entry?;
        let path = entry.path();
        let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
            continue;
        };

        if entry.file_type().is_dir() {
            directories.insert(entry.file_name().to_string_lossy().into_owned(), path.to_path_buf());
        } else if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
            manifests.push((stem, path.to_path_buf()));
        }
    }

    let mut decls = Vec::with_capacity(manifests.len());
    for (stem, path) in manifests {
        let mut decl = read_manifest(&path)?.into_decl(&stem);
        if let Some(children) = directories.remove(&stem) {
            decl.children = discover_level(&children)?;
        }
        decls.push(decl);
    }

    for (directory, path) in directories {
        if let Some(orphan) = first_manifest(&path)? {
            return Err(DiscoveryError::OrphanManifest {
                path: orphan,
                directory,
            });
        }
        tracing::debug!(path = %path.display(), "Skipping directory without manifests");
    }

    Ok(decls)
}

fn read_manifest(path: &Path) -> Result<ControllerManifest, DiscoveryError> {
    let source = fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::trace!(path = %path.display(), "Reading controller manifest");
    toml::from_str(&source).map_err(|source| DiscoveryError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

fn first_manifest(dir: &Path) -> Result<Option<PathBuf>, DiscoveryError> {
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
    {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == MANIFEST_EXTENSION)
        {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}
