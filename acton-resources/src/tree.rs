//! The routing tree
//!
//! [`RoutingTree::build`] turns a forest of [`ControllerDecl`]s into resolved
//! [`ControllerNode`]s. The tree owns every node in an arena. Parents are
//! referenced by [`NodeId`] only, so the parent-owns-children relation is the
//! single ownership path.
//!
//! Resolution happens in two passes:
//!
//! 1. Every declaration is resolved in pre-order: names derived or validated,
//!    action sets computed from the role, structural parents linked.
//! 2. Top-level declarations that name a parent (explicitly, or through their
//!    controller namespace for nested roles) are attached to the unique node
//!    carrying that resource name.
//!
//! Any violation aborts the build with a [`RoutingError::Configuration`].

use crate::action::ActionSet;
use crate::config::RouteSettings;
use crate::decl::ControllerDecl;
use crate::discovery::discover;
use crate::error::{ConfigurationIssue, RoutingError};
use crate::naming::ResourceNaming;
use crate::role::Role;
use crate::route::RouteTable;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Index of a node within its [`RoutingTree`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the tree's arena
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One resolved controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerNode {
    id: NodeId,
    controller: String,
    role: Role,
    resource_name: String,
    segment: String,
    action_set: ActionSet,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ControllerNode {
    /// This node's id
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Declared controller name
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Role of the controller
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Singular resource identifier
    ///
    /// Nested weak resources share their parent's identifier.
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Static path segment the controller mounts at
    ///
    /// Plural for collection and nested resources, singular for singular
    /// resources, the controller's own name for weak resources.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Actions the controller exposes
    #[must_use]
    pub const fn action_set(&self) -> ActionSet {
        self.action_set
    }

    /// Enclosing controller, if any
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Nested controllers in declaration order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The ordered forest of resolved controllers
///
/// Built once at configuration time and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingTree {
    nodes: Vec<ControllerNode>,
    roots: Vec<NodeId>,
}

/// Pending parent lookup for a top-level declaration
struct Attachment {
    node: NodeId,
    parent: String,
}

impl RoutingTree {
    /// Resolve declarations into a tree
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] when any declaration is
    /// malformed: an unresolvable or ambiguous parent, an action outside its
    /// role, a missing or invalid identifier, or a parent cycle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acton_resources::{ControllerDecl, RoutingTree};
    ///
    /// let tree = RoutingTree::build([
    ///     ControllerDecl::collection("Posts").child(ControllerDecl::nested("Comments")),
    /// ])?;
    /// assert_eq!(tree.len(), 2);
    /// # Ok::<(), acton_resources::RoutingError>(())
    /// ```
    pub fn build(decls: impl IntoIterator<Item = ControllerDecl>) -> Result<Self, RoutingError> {
        let mut tree = Self::default();
        let mut attachments = Vec::new();
        let mut top_level = Vec::new();

        for decl in decls {
            let id = tree.insert(&decl, None, &mut attachments)?;
            top_level.push(id);
        }

        for attachment in attachments {
            tree.attach(attachment)?;
        }

        tree.roots = top_level
            .into_iter()
            .filter(|id| tree.nodes[id.0].parent.is_none())
            .collect();

        tracing::debug!(
            controllers = tree.nodes.len(),
            roots = tree.roots.len(),
            "Resolved routing tree"
        );

        Ok(tree)
    }

    /// Build the tree from a directory of controller manifests
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Discovery`] if the directory cannot be read or
    /// a manifest is malformed, and any error [`RoutingTree::build`] returns.
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self, RoutingError> {
        let decls = discover(root)?;
        Self::build(decls)
    }

    fn insert(
        &mut self,
        decl: &ControllerDecl,
        enclosing: Option<NodeId>,
        attachments: &mut Vec<Attachment>,
    ) -> Result<NodeId, RoutingError> {
        let controller = decl.name.trim().to_string();
        let fail = |issue| RoutingError::config(display_name(&controller), issue);

        let own_name = match &decl.resource {
            Some(explicit) => explicit.trim().to_string(),
            None => ResourceNaming::resource_name(&controller),
        };
        if own_name.is_empty() {
            return Err(fail(ConfigurationIssue::MissingResourceName));
        }
        if !ResourceNaming::is_valid_identifier(&own_name) {
            return Err(fail(ConfigurationIssue::InvalidName(own_name)));
        }

        let segment = segment_for(decl.role, &controller, decl.resource.is_some(), &own_name);
        if !ResourceNaming::is_valid_identifier(&segment) {
            return Err(fail(ConfigurationIssue::InvalidName(segment)));
        }

        let action_set = decl.overrides().resolve(decl.role).map_err(fail)?;

        let explicit_parent = match &decl.parent {
            Some(parent) => {
                let parent = parent.trim().to_string();
                if !ResourceNaming::is_valid_identifier(&parent) {
                    return Err(fail(ConfigurationIssue::InvalidName(parent)));
                }
                Some(parent)
            }
            None => None,
        };

        let id = NodeId(self.nodes.len());
        let mut node = ControllerNode {
            id,
            controller: controller.clone(),
            role: decl.role,
            resource_name: own_name.clone(),
            segment,
            action_set,
            parent: None,
            children: Vec::new(),
        };

        if let Some(parent_id) = enclosing {
            let parent = &self.nodes[parent_id.0];
            if !parent.role.can_have_children() {
                return Err(fail(ConfigurationIssue::WeakParent {
                    parent: display_name(&parent.controller),
                }));
            }
            if let Some(declared) = explicit_parent {
                if declared != parent.resource_name {
                    return Err(fail(ConfigurationIssue::ParentMismatch {
                        declared,
                        enclosing: parent.resource_name.clone(),
                    }));
                }
            }
            if decl.role == Role::NestedWeakResource {
                node.resource_name.clone_from(&parent.resource_name);
            }
            node.parent = Some(parent_id);
        } else {
            let lookup = explicit_parent.or_else(|| {
                decl.role
                    .requires_parent()
                    .then(|| ResourceNaming::parent_name(&controller))
                    .flatten()
            });
            match lookup {
                Some(parent) => attachments.push(Attachment { node: id, parent }),
                None if decl.role.requires_parent() => {
                    return Err(fail(ConfigurationIssue::MissingParent { role: decl.role }));
                }
                None => {}
            }
        }

        self.nodes.push(node);
        if let Some(parent_id) = enclosing {
            self.nodes[parent_id.0].children.push(id);
        }

        for child in &decl.children {
            self.insert(child, Some(id), attachments)?;
        }

        Ok(id)
    }

    fn attach(&mut self, attachment: Attachment) -> Result<(), RoutingError> {
        let Attachment { node, parent } = attachment;
        let controller = display_name(&self.nodes[node.0].controller);
        let fail = |issue| RoutingError::config(controller.clone(), issue);

        let candidates: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|candidate| {
                candidate.id != node
                    && candidate.role.can_have_children()
                    && candidate.resource_name == parent
            })
            .map(|candidate| candidate.id)
            .collect();

        let target = match candidates.as_slice() {
            [] => return Err(fail(ConfigurationIssue::UnknownParent { parent })),
            [single] => *single,
            many => {
                let count = many.len();
                return Err(fail(ConfigurationIssue::AmbiguousParent { parent, count }));
            }
        };

        if target == node || self.ancestors(target).any(|ancestor| ancestor == node) {
            return Err(fail(ConfigurationIssue::ParentCycle { parent }));
        }

        if self.nodes[node.0].role == Role::NestedWeakResource {
            let shared = self.nodes[target.0].resource_name.clone();
            self.nodes[node.0].resource_name = shared;
        }
        self.nodes[node.0].parent = Some(target);
        self.nodes[target.0].children.push(node);

        Ok(())
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ControllerNode> {
        self.nodes.get(id.0)
    }

    /// Top-level controllers in declaration order
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of controllers in the tree
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no controllers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in depth-first declaration order, parents before children
    #[must_use]
    pub fn walk(&self) -> Vec<&ControllerNode> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            ordered.push(node);
            stack.extend(node.children.iter().rev().copied());
        }

        ordered
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).and_then(ControllerNode::parent), |current| {
            self.nodes[current.0].parent
        })
    }

    /// Nodes whose resource identifier is `resource`
    pub fn find_by_resource<'a>(
        &'a self,
        resource: &'a str,
    ) -> impl Iterator<Item = &'a ControllerNode> + 'a {
        self.nodes
            .iter()
            .filter(move |node| node.resource_name == resource)
    }

    /// Generate the route table with default settings
    ///
    /// # Errors
    ///
    /// See [`RoutingTree::generate_with`].
    pub fn generate(&self) -> Result<RouteTable, RoutingError> {
        self.generate_with(&RouteSettings::default())
    }

    /// Generate the route table
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::DuplicateRoute`] when two routes resolve to the
    /// same verb and path, and [`RoutingError::Configuration`] for invalid
    /// settings or repeated path parameters. No routes are returned on error.
    pub fn generate_with(&self, settings: &RouteSettings) -> Result<RouteTable, RoutingError> {
        crate::generator::generate(self, settings)
    }
}

/// Path segment a node mounts at
///
/// Weak resources keep the controller's own name. Collections mount at the
/// plural of their resource.
fn segment_for(role: Role, controller: &str, explicit: bool, resource: &str) -> String {
    match role {
        Role::CollectionResource | Role::NestedResource if explicit => {
            ResourceNaming::plural_segment(resource)
        }
        Role::CollectionResource | Role::NestedResource => {
            ResourceNaming::plural_segment(&ResourceNaming::segment_name(controller))
        }
        Role::NestedWeakResource if !explicit => ResourceNaming::segment_name(controller),
        Role::SingularResource | Role::NestedWeakResource => resource.to_string(),
    }
}

fn display_name(controller: &str) -> String {
    if controller.is_empty() {
        "<unnamed>".to_string()
    } else {
        controller.to_string()
    }
}
