//! Controller declarations
//!
//! A [`ControllerDecl`] is the plain configuration record an application
//! writes to describe one controller: its role, optional name overrides,
//! action adjustments and nested children. Declarations can be built in code
//! or deserialized from TOML.
//!
//! # Example
//!
//! ```rust
//! use acton_resources::{Action, ControllerDecl};
//!
//! let posts = ControllerDecl::collection("Posts")
//!     .child(ControllerDecl::nested("Comments"))
//!     .child(ControllerDecl::weak("DeleteConfirmation").only([Action::New, Action::Create]));
//!
//! assert_eq!(posts.children.len(), 2);
//! ```

use crate::action::Action;
use crate::role::{ActionOverrides, Role};
use serde::{Deserialize, Serialize};

/// Declaration of one controller and its nested children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerDecl {
    /// Controller name, e.g. `"Comments"` or `"Posts::CommentsController"`
    pub name: String,

    /// Role of the controller
    pub role: Role,

    /// Explicit resource identifier, overriding the one derived from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Explicit parent resource identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Replacement for the role's default actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<Action>>,

    /// Actions removed from the result
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<Action>,

    /// Actions added beyond the role defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widen: Vec<Action>,

    /// Controllers nested beneath this one, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ControllerDecl>,
}

impl ControllerDecl {
    /// Declare a controller with the given role
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            resource: None,
            parent: None,
            only: None,
            except: Vec::new(),
            widen: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Declare a collection resource controller
    pub fn collection(name: impl Into<String>) -> Self {
        Self::new(name, Role::CollectionResource)
    }

    /// Declare a singular resource controller
    pub fn singular(name: impl Into<String>) -> Self {
        Self::new(name, Role::SingularResource)
    }

    /// Declare a nested resource controller
    pub fn nested(name: impl Into<String>) -> Self {
        Self::new(name, Role::NestedResource)
    }

    /// Declare a nested weak resource controller
    pub fn weak(name: impl Into<String>) -> Self {
        Self::new(name, Role::NestedWeakResource)
    }

    /// Override the derived resource identifier
    #[must_use]
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Name the parent resource explicitly
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Restrict the controller to exactly these actions
    #[must_use]
    pub fn only(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.only = Some(actions.into_iter().collect());
        self
    }

    /// Remove actions from the controller
    #[must_use]
    pub fn except(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.except.extend(actions);
        self
    }

    /// Add actions beyond the role defaults
    #[must_use]
    pub fn widen(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.widen.extend(actions);
        self
    }

    /// Action adjustments of this declaration
    #[must_use]
    pub fn overrides(&self) -> ActionOverrides {
        ActionOverrides {
            only: self.only.clone(),
            except: self.except.clone(),
            widen: self.widen.clone(),
        }
    }

    /// Nest a controller beneath this one
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Nest several controllers beneath this one
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}
