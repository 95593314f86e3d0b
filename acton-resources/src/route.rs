//! Route entries and the immutable route table
//!
//! A [`RouteTable`] is the output of one generation pass: an ordered,
//! `Arc`-backed sequence of [`RouteEntry`] values that can be cloned into
//! request handlers and read without synchronization.

use crate::action::{Action, Verb};
use crate::tree::NodeId;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One segment of a path template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A static segment such as `posts` or `new`
    Literal(String),
    /// A named parameter
    Param {
        /// Parameter name without the leading `:`
        name: String,
        /// Resource whose record the parameter identifies
        resource: String,
        /// Whether it identifies the route's own record rather than an ancestor
        own: bool,
    },
}

/// Ordered literal and parameter segments of a route path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathTemplate {
    segments: Vec<PathSegment>,
}

impl PathTemplate {
    /// An empty template (renders as `/`)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append a static segment
    #[must_use]
    pub fn literal(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Literal(segment.into()));
        self
    }

    /// Append a parameter segment
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, resource: impl Into<String>, own: bool) -> Self {
        self.segments.push(PathSegment::Param {
            name: name.into(),
            resource: resource.into(),
            own,
        });
        self
    }

    /// Segments in path order
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Parameter names in path order
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            PathSegment::Param { name, .. } => Some(name.as_str()),
            PathSegment::Literal(_) => None,
        })
    }

    /// Path with parameter names erased
    ///
    /// Two templates with the same shape match exactly the same requests.
    #[must_use]
    pub fn shape(&self) -> String {
        self.render(|_| ":".to_string())
    }

    /// Path in axum's `{param}` syntax
    ///
    /// # Examples
    ///
    /// ```
    /// use acton_resources::route::PathTemplate;
    ///
    /// let path = PathTemplate::new().literal("posts").param("id", "post", true);
    /// assert_eq!(path.to_string(), "/posts/:id");
    /// assert_eq!(path.to_axum(), "/posts/{id}");
    /// ```
    #[must_use]
    pub fn to_axum(&self) -> String {
        self.render(|name| format!("{{{name}}}"))
    }

    /// Match a concrete request path, returning the captured parameters
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                PathSegment::Literal(literal) if literal == part => {}
                PathSegment::Literal(_) => return None,
                PathSegment::Param { name, .. } => params.push((name.clone(), part.to_string())),
            }
        }
        Some(params)
    }

    /// Prefixes of this template ending in a parameter, as (shape, name) pairs
    pub(crate) fn param_positions(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| match segment {
                PathSegment::Param { name, .. } => Some((
                    Self {
                        segments: self.segments[..=index].to_vec(),
                    }
                    .shape(),
                    name.as_str(),
                )),
                PathSegment::Literal(_) => None,
            })
    }

    fn render(&self, param: impl Fn(&str) -> String) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Literal(literal) => format!("/{literal}"),
                PathSegment::Param { name, .. } => format!("/{}", param(name)),
            })
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|name| format!(":{name}")))
    }
}

impl Serialize for PathTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single route registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// HTTP verb
    pub verb: Verb,
    /// Path template
    pub path: PathTemplate,
    /// Target action
    pub action: Action,
    /// Owning node in the routing tree
    pub node: NodeId,
    /// Declared controller name of the owning node
    pub controller: String,
    /// Resource type the action operates on
    ///
    /// Weak resources target their parent's resource type.
    pub resource: String,
    /// Conventional route name, e.g. `post_comments` or `edit_post`
    pub name: String,
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} => {}#{}", self.verb, self.path, self.controller, self.action)
    }
}

/// A recognized request: the entry it matched and the captured parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Matched entry
    pub entry: &'a RouteEntry,
    /// Captured parameters in path order
    pub params: Vec<(String, String)>,
}

impl RouteMatch<'_> {
    /// Value of a captured parameter
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Two templates that bind different names at the same path position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamConflict {
    /// Path registered first
    pub first: String,
    /// Path using a different name at the same position
    pub second: String,
}

/// Receives route entries from [`RouteTable::register_into`]
///
/// Implemented by host-framework adapters. Registration stops at the first
/// error.
pub trait RouteRegistrar {
    /// Registration failure
    type Error;

    /// Register one entry
    ///
    /// # Errors
    ///
    /// Implementation-defined; returning an error stops registration.
    fn register(&mut self, entry: &RouteEntry) -> Result<(), Self::Error>;
}

impl RouteRegistrar for Vec<RouteEntry> {
    type Error = std::convert::Infallible;

    fn register(&mut self, entry: &RouteEntry) -> Result<(), Self::Error> {
        self.push(entry.clone());
        Ok(())
    }
}

/// Ordered, immutable result of route generation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteTable {
    entries: Arc<[RouteEntry]>,
}

impl RouteTable {
    pub(crate) fn new(entries: Vec<RouteEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Entries in generation order
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Iterate entries in generation order
    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries owned by one node
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter().filter(move |entry| entry.node == node)
    }

    /// Find the first entry matching a request
    ///
    /// Entries are tried in table order, so `/posts/new` resolves to `new`
    /// before `/posts/:id` can claim it.
    ///
    /// # Examples
    ///
    /// ```
    /// use acton_resources::{Action, ControllerDecl, RoutingTree, Verb};
    ///
    /// let table = RoutingTree::build([ControllerDecl::collection("Posts")])?.generate()?;
    /// let matched = table.recognize(Verb::Get, "/posts/42/edit").unwrap();
    /// assert_eq!(matched.entry.action, Action::Edit);
    /// assert_eq!(matched.param("id"), Some("42"));
    /// # Ok::<(), acton_resources::RoutingError>(())
    /// ```
    #[must_use]
    pub fn recognize(&self, verb: Verb, path: &str) -> Option<RouteMatch<'_>> {
        self.entries
            .iter()
            .filter(|entry| entry.verb == verb)
            .find_map(|entry| {
                entry
                    .path
                    .matches(path)
                    .map(|params| RouteMatch { entry, params })
            })
    }

    /// Paths that bind differently named parameters at the same position
    ///
    /// Routers that key parameters by position, such as axum's, reject these.
    #[must_use]
    pub fn param_conflicts(&self) -> Vec<ParamConflict> {
        let mut seen: HashMap<String, (&str, &PathTemplate)> = HashMap::new();
        let mut conflicts = Vec::new();

        for entry in self.entries.iter() {
            for (position, name) in entry.path.param_positions() {
                match seen.get(&position) {
                    Some((existing, path)) if *existing != name => {
                        let conflict = ParamConflict {
                            first: path.to_string(),
                            second: entry.path.to_string(),
                        };
                        if !conflicts.contains(&conflict) {
                            conflicts.push(conflict);
                        }
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(position, (name, &entry.path));
                    }
                }
            }
        }

        conflicts
    }

    /// Hand every entry, in order, to a host registrar
    ///
    /// # Errors
    ///
    /// Returns the registrar's first error; later entries are not registered.
    pub fn register_into<R: RouteRegistrar>(&self, registrar: &mut R) -> Result<(), R::Error> {
        self.entries
            .iter()
            .try_for_each(|entry| registrar.register(entry))
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for RouteTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}
