//! acton-resources: Convention-based resource controllers and nested routes
//!
//! Declare controllers by role, nest them, and get the route table a
//! hand-written Rails-style `resources` block would produce.
//!
//! # Design Principles
//!
//! 1. **Roles, not base classes**: each controller role is a named capability
//!    set applied to a plain declaration
//! 2. **Derived names with an escape hatch**: resource and parent names come
//!    from the controller name and can always be overridden
//! 3. **One-shot generation**: the route table is built once and returned as
//!    an immutable value, or not at all
//!
//! # Quick Start
//!
//! ```rust
//! use acton_resources::prelude::*;
//!
//! # fn main() -> Result<(), RoutingError> {
//! let tree = RoutingTree::build([
//!     ControllerDecl::collection("Posts").child(ControllerDecl::nested("Comments")),
//! ])?;
//! let table = tree.generate()?;
//!
//! let routes: Vec<String> = table.iter().map(|r| format!("{} {}", r.verb, r.path)).collect();
//! assert_eq!(routes[0], "GET /posts");
//! assert_eq!(routes[7], "GET /posts/:id/comments");
//! assert_eq!(table.len(), 10);
//! # Ok(())
//! # }
//! ```
//!
//! # Roles
//!
//! | Role | Default actions | Mounted at |
//! |---|---|---|
//! | collection resource | all seven | `/posts`, `/posts/:id` |
//! | singular resource | all but `index` | `/profile` |
//! | nested resource | `index`, `new`, `create` | `/posts/:id/comments` |
//! | nested weak resource | `new`, `create`, `destroy` | `/posts/:id/delete_confirmation` |
//!
//! # Features
//!
//! - `axum` - build an `axum::Router` from a route table (default)

pub mod action;
pub mod config;
pub mod controller;
pub mod decl;
pub mod discovery;
pub mod error;
mod generator;
#[cfg(feature = "axum")]
pub mod host;
pub mod naming;
pub mod observability;
pub mod role;
pub mod route;
pub mod tree;

pub use action::{Action, ActionSet, Verb};
pub use config::{ParamStyle, ResourcesConfig, RouteSettings};
pub use decl::ControllerDecl;
pub use error::{ConfigurationIssue, DiscoveryError, RoutingError};
pub use role::Role;
pub use route::{PathTemplate, RouteEntry, RouteRegistrar, RouteTable};
pub use tree::{ControllerNode, NodeId, RoutingTree};

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use acton_resources::prelude::*;
    //! ```

    // Declarations and generation
    pub use crate::action::{Action, ActionSet, Verb};
    pub use crate::config::{ParamStyle, RouteSettings};
    pub use crate::decl::ControllerDecl;
    pub use crate::role::Role;
    pub use crate::route::{RouteEntry, RouteRegistrar, RouteTable};
    pub use crate::tree::RoutingTree;

    // Controllers
    pub use crate::controller::{
        ActionOutcome, ActionRequest, AllowAll, Authorizer, Capability, ControllerError,
        ControllerSpec, ParentRef, ResourceController, ResourceLookup, ResourceStore, Scope,
    };

    // Error types
    pub use crate::error::RoutingError;

    // Host integration
    #[cfg(feature = "axum")]
    pub use crate::host::AxumRoutes;
}
