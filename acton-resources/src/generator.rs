//! Route generation
//!
//! Walks a [`RoutingTree`] depth-first, parents before children, and emits
//! one [`RouteEntry`] per (node, action) pair in canonical action order. The
//! walk either produces the complete table or fails; nothing is returned on
//! error.

use crate::action::{Action, Verb};
use crate::config::{ParamStyle, RouteSettings};
use crate::error::{ConfigurationIssue, RoutingError};
use crate::naming::ResourceNaming;
use crate::role::Role;
use crate::route::{PathTemplate, RouteEntry, RouteTable};
use crate::tree::{ControllerNode, RoutingTree};
use std::collections::HashMap;

/// Node name reported for invalid settings
const SETTINGS_NODE: &str = "routing.id_param";

/// A path part before parameter names are assigned
#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Param { resource: String, own: bool },
}

pub(crate) fn generate(
    tree: &RoutingTree,
    settings: &RouteSettings,
) -> Result<RouteTable, RoutingError> {
    if !ResourceNaming::is_valid_identifier(&settings.id_param) {
        return Err(RoutingError::config(
            SETTINGS_NODE,
            ConfigurationIssue::InvalidName(settings.id_param.clone()),
        ));
    }

    let mut entries: Vec<RouteEntry> = Vec::new();
    let mut claimed: HashMap<(Verb, String), usize> = HashMap::new();

    for node in tree.walk() {
        let ancestors: Vec<&ControllerNode> = {
            let mut chain: Vec<&ControllerNode> = tree
                .ancestors(node.id())
                .filter_map(|id| tree.node(id))
                .collect();
            chain.reverse();
            chain
        };

        let before = entries.len();
        for draft in drafts(node, &ancestors, settings.emit_put) {
            let path = assign_names(&draft.parts, settings)
                .map_err(|issue| RoutingError::config(node.controller(), issue))?;

            let key = (draft.verb, path.shape());
            if let Some(&index) = claimed.get(&key) {
                return Err(RoutingError::DuplicateRoute {
                    verb: draft.verb,
                    path: path.to_string(),
                    first: entries[index].controller.clone(),
                    second: node.controller().to_string(),
                });
            }
            claimed.insert(key, entries.len());

            entries.push(RouteEntry {
                verb: draft.verb,
                path,
                action: draft.action,
                node: node.id(),
                controller: node.controller().to_string(),
                resource: node.resource_name().to_string(),
                name: draft.name,
            });
        }

        tracing::debug!(
            controller = node.controller(),
            role = %node.role(),
            resource = node.resource_name(),
            routes = entries.len() - before,
            "Generated controller routes"
        );
    }

    let table = RouteTable::new(entries);

    for conflict in table.param_conflicts() {
        tracing::warn!(
            first = %conflict.first,
            second = %conflict.second,
            "Routes bind different parameter names at the same position; \
             positional routers will reject them (use param_style = \"qualified\")"
        );
    }

    tracing::info!(
        controllers = tree.len(),
        routes = table.len(),
        "Generated route table"
    );

    Ok(table)
}

/// An entry awaiting parameter naming
struct Draft {
    verb: Verb,
    action: Action,
    parts: Vec<Part>,
    name: String,
}

fn drafts(node: &ControllerNode, ancestors: &[&ControllerNode], emit_put: bool) -> Vec<Draft> {
    let mut base: Vec<Part> = Vec::new();
    for ancestor in ancestors {
        base.push(Part::Literal(member_segment(ancestor)));
        base.push(Part::Param {
            resource: ancestor.resource_name().to_string(),
            own: false,
        });
    }
    base.push(Part::Literal(node.segment().to_string()));

    let mut member = base.clone();
    if node.role().has_member_param() {
        member.push(Part::Param {
            resource: node.resource_name().to_string(),
            own: true,
        });
    }

    let prefix = ancestors
        .iter()
        .map(|ancestor| ancestor.resource_name())
        .collect::<Vec<_>>()
        .join("_");
    let (collection_name, member_name) = match node.role() {
        Role::CollectionResource | Role::NestedResource => (
            join_name(&prefix, node.segment()),
            join_name(&prefix, node.resource_name()),
        ),
        Role::SingularResource | Role::NestedWeakResource => {
            let name = join_name(&prefix, node.segment());
            (name.clone(), name)
        }
    };

    let with = |parts: &[Part], literal: &str| {
        let mut parts = parts.to_vec();
        parts.push(Part::Literal(literal.to_string()));
        parts
    };

    let mut drafts = Vec::new();
    for action in node.action_set().iter() {
        let (verbs, parts, name): (&[Verb], Vec<Part>, String) = match action {
            Action::Index => (&[Verb::Get], base.clone(), collection_name.clone()),
            Action::New => (&[Verb::Get], with(&base, "new"), format!("new_{member_name}")),
            Action::Create => (&[Verb::Post], base.clone(), collection_name.clone()),
            Action::Show => (&[Verb::Get], member.clone(), member_name.clone()),
            Action::Edit => (
                &[Verb::Get],
                with(&member, "edit"),
                format!("edit_{member_name}"),
            ),
            Action::Update if emit_put => {
                (&[Verb::Patch, Verb::Put], member.clone(), member_name.clone())
            }
            Action::Update => (&[Verb::Patch], member.clone(), member_name.clone()),
            Action::Destroy => (&[Verb::Delete], member.clone(), member_name.clone()),
        };

        drafts.extend(verbs.iter().map(|&verb| Draft {
            verb,
            action,
            parts: parts.clone(),
            name: name.clone(),
        }));
    }
    drafts
}

/// Literal under which a node's records are addressed when it is an ancestor
fn member_segment(node: &ControllerNode) -> String {
    match node.role() {
        Role::SingularResource => ResourceNaming::plural_segment(node.resource_name()),
        _ => node.segment().to_string(),
    }
}

fn join_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}_{name}")
    }
}

fn assign_names(parts: &[Part], settings: &RouteSettings) -> Result<PathTemplate, ConfigurationIssue> {
    let last_param = parts
        .iter()
        .rposition(|part| matches!(part, Part::Param { .. }));

    let mut path = PathTemplate::new();
    let mut used: Vec<String> = Vec::new();

    for (index, part) in parts.iter().enumerate() {
        match part {
            Part::Literal(literal) => path = path.literal(literal.clone()),
            Part::Param { resource, own } => {
                let bare = match settings.param_style {
                    ParamStyle::Trailing => Some(index) == last_param,
                    ParamStyle::Prefixed => *own,
                    ParamStyle::Qualified => false,
                };
                let name = if bare {
                    settings.id_param.clone()
                } else {
                    ResourceNaming::to_param(resource, &settings.id_param)
                };

                if used.contains(&name) {
                    return Err(ConfigurationIssue::DuplicateParameter {
                        param: name,
                        path: render_parts(parts),
                    });
                }
                used.push(name.clone());
                path = path.param(name, resource.clone(), *own);
            }
        }
    }

    Ok(path)
}

fn render_parts(parts: &[Part]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Part::Literal(literal) => format!("/{literal}"),
            Part::Param { resource, .. } => format!("/:{resource}"),
        })
        .collect()
}
