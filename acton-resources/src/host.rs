//! axum integration
//!
//! [`AxumRoutes`] is a [`RouteRegistrar`] that turns a [`RouteTable`] into an
//! [`axum::Router`]. The caller supplies a factory producing one handler per
//! entry; the adapter attaches it under the entry's verb and converts `:param`
//! templates to axum's `{param}` syntax.
//!
//! # Example
//!
//! ```rust
//! use acton_resources::host::AxumRoutes;
//! use acton_resources::route::RouteEntry;
//! use acton_resources::{ControllerDecl, RoutingTree};
//! use axum::Router;
//!
//! # fn example() -> anyhow::Result<()> {
//! let table = RoutingTree::build([ControllerDecl::collection("Posts")])?.generate()?;
//!
//! let router: Router = AxumRoutes::from_table(&table, |entry: &RouteEntry| {
//!     let label = format!("{}#{}", entry.controller, entry.action);
//!     move || async move { label }
//! })?;
//! # Ok(())
//! # }
//! ```

use crate::route::{RouteEntry, RouteRegistrar, RouteTable};
use axum::handler::Handler;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use std::collections::HashMap;
use std::marker::PhantomData;
use thiserror::Error;

/// Failure to register a route with axum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxumRouteError {
    /// axum keys parameters by position and rejects differing names
    #[error(
        "Route {second} names a parameter differently than {first}; \
         generate with param_style = \"qualified\" for axum"
    )]
    ParamConflict {
        /// Path registered first
        first: String,
        /// Conflicting path
        second: String,
    },
}

/// Handlers for one path, keyed by method
type PathHandlers<H> = (String, Vec<(MethodFilter, H)>);

/// Builds an [`axum::Router`] from route entries
///
/// Entries sharing a path are merged into one method router, so the table
/// order of verbs is preserved per path.
pub struct AxumRoutes<S, H, T, F> {
    factory: F,
    paths: Vec<PathHandlers<H>>,
    index: HashMap<String, usize>,
    params: HashMap<String, (String, String)>,
    _marker: PhantomData<fn() -> (S, T)>,
}

impl<S, H, T, F> AxumRoutes<S, H, T, F>
where
    S: Clone + Send + Sync + 'static,
    H: Handler<T, S>,
    T: 'static,
    F: FnMut(&RouteEntry) -> H,
{
    /// Create an empty registrar around a handler factory
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            paths: Vec::new(),
            index: HashMap::new(),
            params: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Register every entry of `table` and build the router
    ///
    /// # Errors
    ///
    /// Returns [`AxumRouteError::ParamConflict`] when two paths bind
    /// different parameter names at the same position.
    pub fn from_table(table: &RouteTable, factory: F) -> Result<Router<S>, AxumRouteError> {
        let mut routes = Self::new(factory);
        table.register_into(&mut routes)?;
        Ok(routes.into_router())
    }

    /// Number of distinct paths registered so far
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Build the router
    pub fn into_router(self) -> Router<S> {
        self.paths
            .into_iter()
            .fold(Router::new(), |router, (path, handlers)| {
                let method_router = handlers
                    .into_iter()
                    .fold(MethodRouter::new(), |methods, (filter, handler)| {
                        methods.on(filter, handler)
                    });
                router.route(&path, method_router)
            })
    }
}

impl<S, H, T, F> RouteRegistrar for AxumRoutes<S, H, T, F>
where
    S: Clone + Send + Sync + 'static,
    H: Handler<T, S>,
    T: 'static,
    F: FnMut(&RouteEntry) -> H,
{
    type Error = AxumRouteError;

    fn register(&mut self, entry: &RouteEntry) -> Result<(), Self::Error> {
        let rendered = entry.path.to_string();
        for (position, name) in entry.path.param_positions() {
            match self.params.get(&position) {
                Some((existing, first)) if existing != name => {
                    return Err(AxumRouteError::ParamConflict {
                        first: first.clone(),
                        second: rendered,
                    });
                }
                Some(_) => {}
                None => {
                    self.params
                        .insert(position, (name.to_string(), rendered.clone()));
                }
            }
        }

        let handler = (self.factory)(entry);
        let filter = entry.verb.method_filter();
        let path = entry.path.to_axum();

        if let Some(&slot) = self.index.get(&path) {
            self.paths[slot].1.push((filter, handler));
        } else {
            tracing::trace!(path = %path, "Registering axum path");
            self.index.insert(path.clone(), self.paths.len());
            self.paths.push((path, vec![(filter, handler)]));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::{ParamStyle, RouteSettings};
    use crate::decl::ControllerDecl;
    use crate::tree::RoutingTree;
    use axum_test::TestServer;

    fn label(entry: &RouteEntry) -> impl Fn() -> std::future::Ready<String> + Clone {
        let label = format!("{}#{}", entry.controller, entry.action);
        move || std::future::ready(label.clone())
    }

    #[test]
    fn test_merges_verbs_per_path() {
        let table = RoutingTree::build([ControllerDecl::collection("Posts")])
            .unwrap()
            .generate()
            .unwrap();

        let mut routes: AxumRoutes<(), _, _, _> = AxumRoutes::new(label);
        table.register_into(&mut routes).unwrap();

        // /posts, /posts/new, /posts/{id}, /posts/{id}/edit
        assert_eq!(routes.path_count(), 4);
    }

    #[test]
    fn test_conflicting_param_names_rejected() {
        let table = RoutingTree::build([ControllerDecl::collection("Posts")
            .child(ControllerDecl::nested("Comments").widen([Action::Show]))])
        .unwrap()
        .generate()
        .unwrap();

        let result: Result<Router, _> = AxumRoutes::from_table(&table, label);
        assert!(matches!(result, Err(AxumRouteError::ParamConflict { .. })));
    }

    #[tokio::test]
    async fn test_serves_generated_routes() {
        let tree = RoutingTree::build([ControllerDecl::collection("Posts")
            .child(ControllerDecl::nested("Comments").widen([Action::Show]))])
        .unwrap();
        let settings = RouteSettings::default().with_param_style(ParamStyle::Qualified);
        let table = tree.generate_with(&settings).unwrap();

        let router: Router = AxumRoutes::from_table(&table, label).unwrap();
        let server = TestServer::new(router).unwrap();

        server.get("/posts/new").await.assert_text("Posts#new");
        server.get("/posts/1").await.assert_text("Posts#show");
        server.patch("/posts/1").await.assert_text("Posts#update");
        server
            .get("/posts/1/comments/2")
            .await
            .assert_text("Comments#show");
        server.post("/posts/1/comments").await.assert_text("Comments#create");
    }
}
