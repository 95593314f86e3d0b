//! Controller roles and their capability sets
//!
//! A role is a named capability set: the actions a controller may expose and
//! the shape of the paths it mounts at. Roles replace a hierarchy of base
//! controllers with a plain value that can be inspected and tested.

use crate::action::{Action, ActionSet};
use crate::error::ConfigurationIssue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four controller roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full CRUD over a pluralized path, including `index`
    #[serde(alias = "collection")]
    CollectionResource,
    /// A single implicitly-identified record, never `index`
    #[serde(alias = "singular")]
    SingularResource,
    /// Records scoped beneath a parent's member path
    #[serde(alias = "nested")]
    NestedResource,
    /// A path segment beneath a parent that acts on the parent record itself
    #[serde(alias = "weak", alias = "nested_weak")]
    NestedWeakResource,
}

const DEFAULT_NESTED: ActionSet = ActionSet::of(&[Action::Index, Action::New, Action::Create]);
const WEAK: ActionSet = ActionSet::of(&[Action::New, Action::Create, Action::Destroy]);
const SINGULAR: ActionSet = ActionSet::all().without(Action::Index);

impl Role {
    /// Every role
    pub const ALL: [Self; 4] = [
        Self::CollectionResource,
        Self::SingularResource,
        Self::NestedResource,
        Self::NestedWeakResource,
    ];

    /// Actions a controller of this role may ever expose
    #[must_use]
    pub const fn permitted(self) -> ActionSet {
        match self {
            Self::CollectionResource | Self::NestedResource => ActionSet::all(),
            Self::SingularResource => SINGULAR,
            Self::NestedWeakResource => WEAK,
        }
    }

    /// Actions exposed when the declaration does not override them
    #[must_use]
    pub const fn default_actions(self) -> ActionSet {
        match self {
            Self::CollectionResource => ActionSet::all(),
            Self::SingularResource => SINGULAR,
            Self::NestedResource => DEFAULT_NESTED,
            Self::NestedWeakResource => WEAK,
        }
    }

    /// Whether the role only makes sense beneath a parent
    #[must_use]
    pub const fn requires_parent(self) -> bool {
        matches!(self, Self::NestedResource | Self::NestedWeakResource)
    }

    /// Whether other controllers may nest beneath this one
    #[must_use]
    pub const fn can_have_children(self) -> bool {
        !matches!(self, Self::NestedWeakResource)
    }

    /// Whether the role's member routes carry their own id parameter
    #[must_use]
    pub const fn has_member_param(self) -> bool {
        matches!(self, Self::CollectionResource | Self::NestedResource)
    }

    /// Short human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollectionResource => "collection resource",
            Self::SingularResource => "singular resource",
            Self::NestedResource => "nested resource",
            Self::NestedWeakResource => "nested weak resource",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared adjustments to a role's default action set
///
/// `only` replaces the defaults, `widen` adds to them and `except` removes
/// from the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOverrides {
    /// Replacement for the role defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<Action>>,

    /// Actions removed after `only` and `widen` are applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<Action>,

    /// Actions added on top of the defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widen: Vec<Action>,
}

impl ActionOverrides {
    /// Whether the declaration keeps the role defaults untouched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.only.is_none() && self.except.is_empty() && self.widen.is_empty()
    }

    /// Compute the final action set for `role`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationIssue::ActionNotPermitted`] for the first action
    /// (in canonical order) outside the role's capability set, and
    /// [`ConfigurationIssue::IndexRequired`] when a collection resource ends up
    /// without `index`.
    pub fn resolve(&self, role: Role) -> Result<ActionSet, ConfigurationIssue> {
        let base = self
            .only
            .as_ref()
            .map_or_else(|| role.default_actions(), |only| only.iter().copied().collect());

        let requested = base
            .union(self.widen.iter().copied().collect())
            .difference(self.except.iter().copied().collect());

        if let Some(action) = requested.difference(role.permitted()).iter().next() {
            return Err(ConfigurationIssue::ActionNotPermitted { action, role });
        }

        if role == Role::CollectionResource && !requested.contains(Action::Index) {
            return Err(ConfigurationIssue::IndexRequired);
        }

        Ok(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_sets() {
        assert_eq!(Role::CollectionResource.default_actions(), ActionSet::all());
        assert_eq!(
            Role::SingularResource.default_actions(),
            ActionSet::of(&[
                Action::New,
                Action::Create,
                Action::Show,
                Action::Edit,
                Action::Update,
                Action::Destroy
            ])
        );
        assert_eq!(
            Role::NestedResource.default_actions(),
            ActionSet::of(&[Action::New, Action::Create, Action::Index])
        );
        assert_eq!(
            Role::NestedWeakResource.default_actions(),
            ActionSet::of(&[Action::New, Action::Create, Action::Destroy])
        );
    }

    #[test]
    fn test_singular_never_includes_index() {
        let overrides = ActionOverrides {
            widen: vec![Action::Index],
            ..Default::default()
        };
        assert_eq!(
            overrides.resolve(Role::SingularResource),
            Err(ConfigurationIssue::ActionNotPermitted {
                action: Action::Index,
                role: Role::SingularResource,
            })
        );
    }

    #[test]
    fn test_collection_requires_index() {
        let overrides = ActionOverrides {
            except: vec![Action::Index],
            ..Default::default()
        };
        assert_eq!(
            overrides.resolve(Role::CollectionResource),
            Err(ConfigurationIssue::IndexRequired)
        );
    }

    #[test]
    fn test_nested_can_be_widened() {
        let overrides = ActionOverrides {
            widen: vec![Action::Show, Action::Destroy],
            ..Default::default()
        };
        let actions = overrides.resolve(Role::NestedResource).unwrap();
        assert_eq!(
            actions,
            ActionSet::of(&[
                Action::Index,
                Action::New,
                Action::Create,
                Action::Show,
                Action::Destroy
            ])
        );
    }

    #[test]
    fn test_weak_rejects_member_actions() {
        let overrides = ActionOverrides {
            only: Some(vec![Action::New, Action::Show]),
            ..Default::default()
        };
        assert!(matches!(
            overrides.resolve(Role::NestedWeakResource),
            Err(ConfigurationIssue::ActionNotPermitted {
                action: Action::Show,
                ..
            })
        ));
    }

    #[test]
    fn test_only_then_except() {
        let overrides = ActionOverrides {
            only: Some(vec![Action::New, Action::Create]),
            except: vec![Action::New],
            widen: vec![],
        };
        assert_eq!(
            overrides.resolve(Role::NestedWeakResource).unwrap(),
            ActionSet::of(&[Action::Create])
        );
        assert!(!overrides.is_empty());
        assert!(ActionOverrides::default().is_empty());
    }

    #[test]
    fn test_role_aliases_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            role: Role,
        }

        let parsed: Wrapper = toml::from_str(r#"role = "weak""#).unwrap();
        assert_eq!(parsed.role, Role::NestedWeakResource);
        let parsed: Wrapper = toml::from_str(r#"role = "collection_resource""#).unwrap();
        assert_eq!(parsed.role, Role::CollectionResource);
    }
}
