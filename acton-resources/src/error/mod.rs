//! Error types and error handling
//!
//! Building a tree and generating its routes either succeed completely or fail
//! with a [`RoutingError`] naming the offending controller and the rule it
//! broke. No partial route table is ever produced.

use crate::action::{Action, Verb};
use crate::role::Role;
use std::path::PathBuf;
use thiserror::Error;

/// Routing configuration and generation error
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A controller declaration violates a rule of its role
    #[error("Configuration error in controller `{node}`: {issue}")]
    Configuration {
        /// Declared controller name
        node: String,
        /// The rule that was violated
        issue: ConfigurationIssue,
    },

    /// Two generated routes resolve to the same verb and path
    #[error("Duplicate route {verb} {path}: declared by `{first}` and `{second}`")]
    DuplicateRoute {
        /// HTTP verb shared by both routes
        verb: Verb,
        /// Rendered path of the second route
        path: String,
        /// Controller of the route registered first
        first: String,
        /// Controller of the colliding route
        second: String,
    },

    /// Controller manifests could not be discovered
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl RoutingError {
    /// Shorthand for a [`RoutingError::Configuration`]
    pub(crate) fn config(node: impl Into<String>, issue: ConfigurationIssue) -> Self {
        Self::Configuration {
            node: node.into(),
            issue,
        }
    }
}

/// The specific rule a controller declaration violates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationIssue {
    /// Nested role declared without an enclosing parent or a parent name
    #[error("{role} requires a parent controller but none encloses it")]
    MissingParent {
        /// Role of the declaration
        role: Role,
    },

    /// The named parent does not exist in the tree
    #[error("parent resource `{parent}` is not declared anywhere in the tree")]
    UnknownParent {
        /// Requested parent resource name
        parent: String,
    },

    /// More than one node carries the requested parent name
    #[error("parent resource `{parent}` is ambiguous ({count} controllers declare it)")]
    AmbiguousParent {
        /// Requested parent resource name
        parent: String,
        /// Number of candidates
        count: usize,
    },

    /// An explicit parent name disagrees with the enclosing controller
    #[error("explicit parent `{declared}` does not match enclosing resource `{enclosing}`")]
    ParentMismatch {
        /// Name given in the declaration
        declared: String,
        /// Resource name of the enclosing controller
        enclosing: String,
    },

    /// Attaching to the named parent would make the node its own ancestor
    #[error("parent `{parent}` is a descendant of this controller")]
    ParentCycle {
        /// Requested parent resource name
        parent: String,
    },

    /// Weak resources have no identity of their own to nest beneath
    #[error("nested weak resource `{parent}` cannot have children")]
    WeakParent {
        /// Controller name of the weak parent
        parent: String,
    },

    /// Action outside the role's capability set
    #[error("action `{action}` is not permitted for a {role}")]
    ActionNotPermitted {
        /// Offending action
        action: Action,
        /// Role of the declaration
        role: Role,
    },

    /// Collection resources are defined by their `index` action
    #[error("a collection resource must include the `index` action")]
    IndexRequired,

    /// No resource identifier given and none derivable from the name
    #[error("no resource identifier given and none can be derived from the controller name")]
    MissingResourceName,

    /// Identifier is not usable as a path segment
    #[error("`{0}` is not a valid identifier (expected lowercase letters, digits and underscores)")]
    InvalidName(String),

    /// The same parameter name appears twice in one path
    #[error("path parameter `{param}` appears more than once in {path}")]
    DuplicateParameter {
        /// Repeated parameter name
        param: String,
        /// Rendered path
        path: String,
    },
}

/// Failure while reading controller manifests from a directory
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory tree could not be walked
    #[error("Failed to walk controllers directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A manifest file could not be read
    #[error("Failed to read manifest {}: {source}", path.display())]
    Io {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A manifest file is not valid TOML for a controller
    #[error("Invalid manifest {}: {source}", path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },

    /// A manifest lives in a directory no parent manifest claims
    #[error("Manifest {} has no parent manifest for directory `{directory}`", path.display())]
    OrphanManifest {
        /// Manifest path
        path: PathBuf,
        /// Directory name lacking a `<name>.toml` sibling
        directory: String,
    },
}
