//! Resource controllers
//!
//! A [`ResourceController`] applies a role's capability set to a store and an
//! authorizer. It never subclasses: the role, resource names and action set
//! come from a [`ControllerSpec`] snapshotted from the routing tree, while
//! persistence, policy and record lookup are supplied through the
//! [`ResourceStore`], [`Authorizer`] and [`ResourceLookup`] traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use acton_resources::controller::{
//!     ActionRequest, AllowAll, ControllerSpec, ResourceController, ResourceStore,
//! };
//! use acton_resources::{Action, ControllerDecl, RoutingTree};
//!
//! # async fn example<S: ResourceStore>(store: S) -> anyhow::Result<()> {
//! let tree = RoutingTree::build([
//!     ControllerDecl::collection("Posts").child(ControllerDecl::nested("Comments")),
//! ])?;
//! let spec = ControllerSpec::find(&tree, "Comments").expect("declared above");
//! let comments = ResourceController::new(spec, store, AllowAll);
//!
//! let outcome = comments
//!     .dispatch(ActionRequest::new(Action::Index).parent("post", "42"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod traits;

pub use dispatch::ResourceController;
pub use traits::{AllowAll, Authorizer, DefaultLookup, ResourceLookup, ResourceStore};

#[cfg(test)]
pub use traits::MockAuthorizer;

use crate::action::{Action, ActionSet};
use crate::role::Role;
use crate::route::{PathSegment, RouteMatch};
use crate::tree::{NodeId, RoutingTree};
use thiserror::Error;

/// Boxed error returned by store and policy collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for controller dispatch
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Identity and capabilities of one controller, taken from the routing tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSpec {
    node: NodeId,
    controller: String,
    role: Role,
    resource: String,
    parent_resource: Option<String>,
    actions: ActionSet,
}

impl ControllerSpec {
    /// Snapshot the node `id` of `tree`
    #[must_use]
    pub fn from_node(tree: &RoutingTree, id: NodeId) -> Option<Self> {
        let node = tree.node(id)?;
        let parent_resource = node
            .parent()
            .and_then(|parent| tree.node(parent))
            .map(|parent| parent.resource_name().to_string());

        Some(Self {
            node: id,
            controller: node.controller().to_string(),
            role: node.role(),
            resource: node.resource_name().to_string(),
            parent_resource,
            actions: node.action_set(),
        })
    }

    /// Snapshot the first node declared with the controller name `controller`
    #[must_use]
    pub fn find(tree: &RoutingTree, controller: &str) -> Option<Self> {
        tree.walk()
            .into_iter()
            .find(|node| node.controller() == controller)
            .and_then(|node| Self::from_node(tree, node.id()))
    }

    /// Owning node
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
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

    /// Resource type the controller acts on
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Resource type of the enclosing controller
    #[must_use]
    pub fn parent_resource(&self) -> Option<&str> {
        self.parent_resource.as_deref()
    }

    /// Actions the controller exposes
    #[must_use]
    pub const fn actions(&self) -> ActionSet {
        self.actions
    }
}

/// A reference to an ancestor record taken from the request path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRef {
    /// Resource type of the ancestor
    pub resource: String,
    /// Identifier from the path
    pub id: String,
}

impl ParentRef {
    /// Reference `resource` record `id`
    pub fn new(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: id.into(),
        }
    }
}

/// Ancestor records a request is scoped to, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    ancestors: Vec<ParentRef>,
}

impl Scope {
    /// Scope with no ancestors
    #[must_use]
    pub const fn root() -> Self {
        Self {
            ancestors: Vec::new(),
        }
    }

    /// Ancestors, outermost first
    #[must_use]
    pub fn ancestors(&self) -> &[ParentRef] {
        &self.ancestors
    }

    /// The innermost ancestor
    #[must_use]
    pub fn parent(&self) -> Option<&ParentRef> {
        self.ancestors.last()
    }

    /// The ancestor above the innermost one
    #[must_use]
    pub fn grandparent(&self) -> Option<&ParentRef> {
        self.ancestors.iter().rev().nth(1)
    }

    /// Whether the scope has no ancestors
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Scope the innermost ancestor itself lives in
    #[must_use]
    pub fn enclosing(&self) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.pop();
        Self { ancestors }
    }

    /// Append an inner ancestor
    pub fn push(&mut self, parent: ParentRef) {
        self.ancestors.push(parent);
    }
}

/// What an authorizer is asked to allow
///
/// Nested weak resources have no record of their own: their capability names
/// the parent's resource type and id, with the weak controller in
/// `controller` so policies can tell a confirmation step from the parent's own
/// actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    /// Requested action
    pub action: Action,
    /// Resource type acted on
    pub resource: String,
    /// Controller performing the action
    pub controller: String,
    /// Record identifier, when the action addresses one record
    pub id: Option<String>,
    /// Enclosing record, when the resource is nested
    pub parent: Option<ParentRef>,
}

/// Input to [`ResourceController::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest<A> {
    /// Requested action
    pub action: Action,
    /// Record identifier for member actions
    pub id: Option<String>,
    /// Ancestor records
    pub scope: Scope,
    /// Submitted attributes for `create` and `update`
    pub attributes: Option<A>,
}

impl<A> ActionRequest<A> {
    /// Request `action` with no id, scope or attributes
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            id: None,
            scope: Scope::root(),
            attributes: None,
        }
    }

    /// Address a record by id
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add an ancestor; call outermost first
    #[must_use]
    pub fn parent(mut self, resource: impl Into<String>, id: impl Into<String>) -> Self {
        self.scope.push(ParentRef::new(resource, id));
        self
    }

    /// Attach submitted attributes
    #[must_use]
    pub fn attributes(mut self, attributes: A) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Build a request from a recognized route
    ///
    /// Parameters identifying the route's own record become the id; all
    /// others become ancestors in path order.
    #[must_use]
    pub fn from_match(matched: &RouteMatch<'_>) -> Self {
        let mut request = Self::new(matched.entry.action);
        let params = matched
            .entry
            .path
            .segments()
            .iter()
            .filter_map(|segment| match segment {
                PathSegment::Param { resource, own, .. } => Some((resource, *own)),
                PathSegment::Literal(_) => None,
            })
            .zip(matched.params.iter().map(|(_, value)| value));

        for ((resource, own), value) in params {
            if own {
                request.id = Some(value.clone());
            } else {
                request.scope.push(ParentRef::new(resource.clone(), value.clone()));
            }
        }
        request
    }
}

/// Result of a dispatched action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<R> {
    /// `index`: records in scope
    Listed(Vec<R>),
    /// `new`: an unsaved record
    Built(R),
    /// `create`: the persisted record
    Created(R),
    /// `show`: the loaded record
    Shown(R),
    /// `edit`: the record to edit
    Editing(R),
    /// `update`: the updated record
    Updated(R),
    /// `destroy`: the record was removed
    Destroyed,
    /// Nested weak resource action, to be completed by the application
    Weak {
        /// Requested action
        action: Action,
        /// The parent record the action operates on
        parent: ParentRef,
    },
}

/// Controller dispatch error
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The action is outside the controller's action set
    #[error("Controller `{controller}` does not support action `{action}`")]
    ActionNotSupported {
        /// Controller name
        controller: String,
        /// Requested action
        action: Action,
    },

    /// A required identifier or the submitted attributes are missing
    #[error("Controller `{controller}` requires parameter `{param}`")]
    MissingParameter {
        /// Controller name
        controller: String,
        /// Missing parameter
        param: String,
    },

    /// A record or ancestor could not be found
    #[error("{resource}{} not found", describe_id(.id.as_deref()))]
    NotFound {
        /// Resource type
        resource: String,
        /// Identifier that failed to resolve (absent for singular resources)
        id: Option<String>,
    },

    /// The authorizer denied the capability
    #[error("Not authorized to {action} {resource}")]
    Forbidden {
        /// Requested action
        action: Action,
        /// Resource type
        resource: String,
    },

    /// The store failed
    #[error("Store error: {0}")]
    Store(#[source] BoxError),

    /// The authorizer failed to reach a decision
    #[error("Authorization check failed: {0}")]
    Authorization(#[source] BoxError),
}

fn describe_id(id: Option<&str>) -> String {
    id.map(|id| format!(" `{id}`")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Verb;
    use crate::config::{ParamStyle, RouteSettings};
    use crate::decl::ControllerDecl;

    #[test]
    fn test_spec_from_tree() {
        let tree = RoutingTree::build([ControllerDecl::collection("Posts")
            .child(ControllerDecl::weak("DeleteConfirmation").only([Action::New, Action::Create]))])
        .unwrap();

        let spec = ControllerSpec::find(&tree, "DeleteConfirmation").unwrap();
        assert_eq!(spec.role(), Role::NestedWeakResource);
        assert_eq!(spec.resource(), "post");
        assert_eq!(spec.parent_resource(), Some("post"));
        assert_eq!(spec.actions(), ActionSet::of(&[Action::New, Action::Create]));

        assert!(ControllerSpec::find(&tree, "Missing").is_none());
    }

    #[test]
    fn test_scope_navigation() {
        let request: ActionRequest<()> = ActionRequest::new(Action::Show)
            .parent("blog", "1")
            .parent("post", "2")
            .id("3");

        assert_eq!(request.scope.parent(), Some(&ParentRef::new("post", "2")));
        assert_eq!(request.scope.grandparent(), Some(&ParentRef::new("blog", "1")));
        assert_eq!(request.scope.enclosing().ancestors().len(), 1);
        assert!(Scope::root().is_root());
    }

    #[test]
    fn test_request_from_match() {
        let tree = RoutingTree::build([ControllerDecl::collection("Posts")
            .child(ControllerDecl::nested("Comments").widen([Action::Show]))])
        .unwrap();
        let table = tree
            .generate_with(&RouteSettings::default().with_param_style(ParamStyle::Prefixed))
            .unwrap();

        let matched = table.recognize(Verb::Get, "/posts/7/comments/9").unwrap();
        let request: ActionRequest<()> = ActionRequest::from_match(&matched);

        assert_eq!(request.action, Action::Show);
        assert_eq!(request.id.as_deref(), Some("9"));
        assert_eq!(request.scope.ancestors(), &[ParentRef::new("post", "7")]);
    }

    #[test]
    fn test_not_found_message() {
        let err = ControllerError::NotFound {
            resource: "post".to_string(),
            id: Some("7".to_string()),
        };
        assert_eq!(err.to_string(), "post `7` not found");

        let err = ControllerError::NotFound {
            resource: "profile".to_string(),
            id: None,
        };
        assert_eq!(err.to_string(), "profile not found");
    }
}
