//! Action dispatch

use super::{
    ActionOutcome, ActionRequest, Authorizer, Capability, ControllerError, ControllerResult,
    ControllerSpec, DefaultLookup, ParentRef, ResourceLookup, ResourceStore, Scope,
};
use crate::action::Action;
use crate::naming::ResourceNaming;
use crate::role::Role;
use crate::route::RouteEntry;

/// Parameter name reported when attributes are missing
const ATTRIBUTES_PARAM: &str = "attributes";

/// A controller bound to its store, authorizer and lookup
///
/// Dispatch always runs in the same order:
///
/// 1. Reject actions outside the controller's action set
/// 2. Resolve the parent record for nested controllers
/// 3. Resolve the addressed record for member actions
/// 4. Ask the authorizer
/// 5. Call the store
///
/// Nothing reaches a store mutation without an allowed capability.
#[derive(Debug, Clone)]
pub struct ResourceController<S, A, L = DefaultLookup> {
    spec: ControllerSpec,
    store: S,
    authorizer: A,
    lookup: L,
}

impl<S, A> ResourceController<S, A, DefaultLookup>
where
    S: ResourceStore,
    A: Authorizer,
{
    /// Bind a controller spec to its collaborators
    pub const fn new(spec: ControllerSpec, store: S, authorizer: A) -> Self {
        Self {
            spec,
            store,
            authorizer,
            lookup: DefaultLookup,
        }
    }
}

impl<S, A, L> ResourceController<S, A, L>
where
    S: ResourceStore,
    A: Authorizer,
    L: ResourceLookup<S>,
{
    /// Replace the record lookup
    #[must_use]
    pub fn with_lookup<M: ResourceLookup<S>>(self, lookup: M) -> ResourceController<S, A, M> {
        ResourceController {
            spec: self.spec,
            store: self.store,
            authorizer: self.authorizer,
            lookup,
        }
    }

    /// The controller's spec
    #[must_use]
    pub const fn spec(&self) -> &ControllerSpec {
        &self.spec
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether `entry` was generated for this controller
    #[must_use]
    pub fn handles(&self, entry: &RouteEntry) -> bool {
        entry.node == self.spec.node()
    }

    /// Run one action
    ///
    /// # Errors
    ///
    /// - [`ControllerError::ActionNotSupported`] for actions outside the set
    /// - [`ControllerError::MissingParameter`] for a missing parent id, record
    ///   id or attributes
    /// - [`ControllerError::NotFound`] when the parent or record does not exist
    /// - [`ControllerError::Forbidden`] when the authorizer denies the action
    /// - [`ControllerError::Store`] / [`ControllerError::Authorization`] when a
    ///   collaborator fails
    pub async fn dispatch(
        &self,
        request: ActionRequest<S::Attributes>,
    ) -> ControllerResult<ActionOutcome<S::Record>> {
        let ActionRequest {
            action,
            id,
            scope,
            attributes,
        } = request;

        tracing::debug!(
            controller = self.spec.controller(),
            action = %action,
            "Dispatching action"
        );

        if !self.spec.actions().contains(action) {
            return Err(ControllerError::ActionNotSupported {
                controller: self.spec.controller().to_string(),
                action,
            });
        }

        let parent = self.resolve_parent(&scope).await?;

        if self.spec.role() == Role::NestedWeakResource {
            let parent = parent.ok_or_else(|| self.missing(self.parent_param()))?;
            self.authorize(Capability {
                action,
                resource: self.spec.resource().to_string(),
                controller: self.spec.controller().to_string(),
                id: Some(parent.id.clone()),
                parent: scope.grandparent().cloned(),
            })
            .await?;
            return Ok(ActionOutcome::Weak { action, parent });
        }

        let record = if action.is_member() {
            Some(self.resolve_record(&scope, id.as_deref()).await?)
        } else {
            None
        };

        let attributes = match action {
            Action::Create | Action::Update => {
                Some(attributes.ok_or_else(|| self.missing(ATTRIBUTES_PARAM.to_string()))?)
            }
            _ => None,
        };

        self.authorize(Capability {
            action,
            resource: self.spec.resource().to_string(),
            controller: self.spec.controller().to_string(),
            id: if self.spec.role().has_member_param() {
                id
            } else {
                None
            },
            parent,
        })
        .await?;

        let store = &self.store;
        let outcome = match (action, record, attributes) {
            (Action::Index, _, _) => {
                ActionOutcome::Listed(store.list(&scope).await.map_err(ControllerError::Store)?)
            }
            (Action::New, _, _) => {
                ActionOutcome::Built(store.build(&scope).await.map_err(ControllerError::Store)?)
            }
            (Action::Create, _, Some(attributes)) => ActionOutcome::Created(
                store
                    .create(&scope, attributes)
                    .await
                    .map_err(ControllerError::Store)?,
            ),
            (Action::Show, Some(record), _) => ActionOutcome::Shown(record),
            (Action::Edit, Some(record), _) => ActionOutcome::Editing(record),
            (Action::Update, Some(record), Some(attributes)) => ActionOutcome::Updated(
                store
                    .update(&scope, record, attributes)
                    .await
                    .map_err(ControllerError::Store)?,
            ),
            (Action::Destroy, Some(record), _) => {
                store
                    .destroy(&scope, record)
                    .await
                    .map_err(ControllerError::Store)?;
                ActionOutcome::Destroyed
            }
            (action, _, _) => {
                return Err(ControllerError::ActionNotSupported {
                    controller: self.spec.controller().to_string(),
                    action,
                });
            }
        };

        Ok(outcome)
    }

    async fn resolve_parent(&self, scope: &Scope) -> ControllerResult<Option<ParentRef>> {
        let Some(parent_resource) = self.spec.parent_resource() else {
            return Ok(None);
        };

        let parent = scope
            .parent()
            .filter(|parent| parent.resource == parent_resource)
            .cloned()
            .ok_or_else(|| self.missing(self.parent_param()))?;

        let exists = self
            .lookup
            .find_parent(&self.store, scope, &parent)
            .await
            .map_err(ControllerError::Store)?;
        if !exists {
            return Err(ControllerError::NotFound {
                resource: parent.resource,
                id: Some(parent.id),
            });
        }

        Ok(Some(parent))
    }

    async fn resolve_record(&self, scope: &Scope, id: Option<&str>) -> ControllerResult<S::Record> {
        let resource = self.spec.resource();

        if !self.spec.role().has_member_param() {
            return self
                .lookup
                .find_singleton(&self.store, scope)
                .await
                .map_err(ControllerError::Store)?
                .ok_or_else(|| ControllerError::NotFound {
                    resource: resource.to_string(),
                    id: None,
                });
        }

        let id = id.ok_or_else(|| self.missing("id".to_string()))?;
        self.lookup
            .find_record(&self.store, scope, id)
            .await
            .map_err(ControllerError::Store)?
            .ok_or_else(|| ControllerError::NotFound {
                resource: resource.to_string(),
                id: Some(id.to_string()),
            })
    }

    async fn authorize(&self, capability: Capability) -> ControllerResult<()> {
        let allowed = self
            .authorizer
            .authorize(&capability)
            .await
            .map_err(ControllerError::Authorization)?;

        if allowed {
            Ok(())
        } else {
            tracing::debug!(
                controller = self.spec.controller(),
                action = %capability.action,
                resource = %capability.resource,
                "Action denied"
            );
            Err(ControllerError::Forbidden {
                action: capability.action,
                resource: capability.resource,
            })
        }
    }

    fn parent_param(&self) -> String {
        self.spec.parent_resource().map_or_else(
            || "parent_id".to_string(),
            |parent| ResourceNaming::to_param(parent, "id"),
        )
    }

    fn missing(&self, param: String) -> ControllerError {
        ControllerError::MissingParameter {
            controller: self.spec.controller().to_string(),
            param,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{BoxError, MockAuthorizer};
    use crate::decl::ControllerDecl;
    use crate::tree::RoutingTree;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Comment {
        id: String,
        post: String,
        body: String,
    }

    #[derive(Default)]
    struct MemoryStore {
        comments: Mutex<Vec<Comment>>,
        posts: Vec<String>,
        mutations: AtomicUsize,
    }

    impl MemoryStore {
        fn with_post(post: &str) -> Self {
            Self {
                posts: vec![post.to_string()],
                ..Default::default()
            }
        }

        fn parent_id(scope: &Scope) -> String {
            scope.parent().map(|parent| parent.id.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ResourceStore for MemoryStore {
        type Record = Comment;
        type Attributes = String;

        async fn list(&self, scope: &Scope) -> Result<Vec<Comment>, BoxError> {
            let post = Self::parent_id(scope);
            Ok(self
                .comments
                .lock()
                .unwrap()
                .iter()
                .filter(|comment| comment.post == post)
                .cloned()
                .collect())
        }

        async fn build(&self, scope: &Scope) -> Result<Comment, BoxError> {
            Ok(Comment {
                id: String::new(),
                post: Self::parent_id(scope),
                body: String::new(),
            })
        }

        async fn find(&self, scope: &Scope, id: &str) -> Result<Option<Comment>, BoxError> {
            Ok(self.list(scope).await?.into_iter().find(|comment| comment.id == id))
        }

        async fn parent_exists(&self, _scope: &Scope, parent: &ParentRef) -> Result<bool, BoxError> {
            Ok(self.posts.contains(&parent.id))
        }

        async fn create(&self, scope: &Scope, body: String) -> Result<Comment, BoxError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut comments = self.comments.lock().unwrap();
            let comment = Comment {
                id: (comments.len() + 1).to_string(),
                post: Self::parent_id(scope),
                body,
            };
            comments.push(comment.clone());
            Ok(comment)
        }

        async fn update(&self, _scope: &Scope, record: Comment, body: String) -> Result<Comment, BoxError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut comments = self.comments.lock().unwrap();
            let updated = Comment { body, ..record };
            if let Some(slot) = comments.iter_mut().find(|comment| comment.id == updated.id) {
                *slot = updated.clone();
            }
            Ok(updated)
        }

        async fn destroy(&self, _scope: &Scope, record: Comment) -> Result<(), BoxError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            self.comments.lock().unwrap().retain(|comment| comment.id != record.id);
            Ok(())
        }
    }

    fn spec(controller: &str) -> ControllerSpec {
        let tree = RoutingTree::build([ControllerDecl::collection("Posts")
            .child(ControllerDecl::nested("Comments").widen([Action::Show, Action::Update, Action::Destroy]))
            .child(ControllerDecl::weak("DeleteConfirmation").only([Action::New, Action::Create]))])
        .unwrap();
        ControllerSpec::find(&tree, controller).unwrap()
    }

    fn allowing() -> MockAuthorizer {
        let mut authorizer = MockAuthorizer::new();
        authorizer.expect_authorize().returning(|_| Ok(true));
        authorizer
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), allowing());

        let created = controller
            .dispatch(ActionRequest::new(Action::Create).parent("post", "1").attributes("hi".to_string()))
            .await
            .unwrap();
        assert!(matches!(created, ActionOutcome::Created(ref comment) if comment.body == "hi"));

        let listed = controller
            .dispatch(ActionRequest::new(Action::Index).parent("post", "1"))
            .await
            .unwrap();
        match listed {
            ActionOutcome::Listed(comments) => assert_eq!(comments.len(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_action_rejected() {
        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), MockAuthorizer::new());

        let err = controller
            .dispatch(ActionRequest::new(Action::Edit).parent("post", "1").id("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::ActionNotSupported {
                action: Action::Edit,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_denial_prevents_store_mutation() {
        let mut authorizer = MockAuthorizer::new();
        authorizer
            .expect_authorize()
            .withf(|capability| {
                capability.action == Action::Create
                    && capability.resource == "comment"
                    && capability.parent == Some(ParentRef::new("post", "1"))
            })
            .times(1)
            .returning(|_| Ok(false));

        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), authorizer);
        let err = controller
            .dispatch(ActionRequest::new(Action::Create).parent("post", "1").attributes("spam".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Forbidden { .. }));
        assert_eq!(controller.store().mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_and_unknown_parent() {
        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), MockAuthorizer::new());

        let err = controller
            .dispatch(ActionRequest::new(Action::Index))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::MissingParameter { ref param, .. } if param == "post_id"
        ));

        let err = controller
            .dispatch(ActionRequest::new(Action::Index).parent("post", "99"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::NotFound { ref resource, .. } if resource == "post"));
    }

    #[tokio::test]
    async fn test_member_actions_resolve_record() {
        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), allowing());
        controller
            .dispatch(ActionRequest::new(Action::Create).parent("post", "1").attributes("a".to_string()))
            .await
            .unwrap();

        let updated = controller
            .dispatch(
                ActionRequest::new(Action::Update)
                    .parent("post", "1")
                    .id("1")
                    .attributes("b".to_string()),
            )
            .await
            .unwrap();
        assert!(matches!(updated, ActionOutcome::Updated(ref comment) if comment.body == "b"));

        let missing = controller
            .dispatch(ActionRequest::new(Action::Show).parent("post", "1").id("42"))
            .await
            .unwrap_err();
        assert!(matches!(missing, ControllerError::NotFound { id: Some(ref id), .. } if id == "42"));

        let destroyed = controller
            .dispatch(ActionRequest::new(Action::Destroy).parent("post", "1").id("1"))
            .await
            .unwrap();
        assert_eq!(destroyed, ActionOutcome::Destroyed);
        assert_eq!(controller.store().mutations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_attributes() {
        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), MockAuthorizer::new());
        let err = controller
            .dispatch(ActionRequest::new(Action::Create).parent("post", "1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::MissingParameter { ref param, .. } if param == "attributes"
        ));
    }

    #[tokio::test]
    async fn test_weak_authorizes_against_parent() {
        let mut authorizer = MockAuthorizer::new();
        authorizer
            .expect_authorize()
            .withf(|capability| {
                capability.resource == "post"
                    && capability.controller == "DeleteConfirmation"
                    && capability.id.as_deref() == Some("1")
            })
            .times(1)
            .returning(|_| Ok(true));

        let controller = ResourceController::new(
            spec("DeleteConfirmation"),
            MemoryStore::with_post("1"),
            authorizer,
        );
        let outcome = controller
            .dispatch(ActionRequest::new(Action::Create).parent("post", "1"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::Weak {
                action: Action::Create,
                parent: ParentRef::new("post", "1"),
            }
        );
        assert_eq!(controller.store().mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authorizer_failure_is_reported() {
        let mut authorizer = MockAuthorizer::new();
        authorizer
            .expect_authorize()
            .returning(|_| Err("policy service unavailable".into()));

        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), authorizer);
        let err = controller
            .dispatch(ActionRequest::new(Action::Index).parent("post", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_custom_lookup() {
        struct BySlug;

        #[async_trait]
        impl ResourceLookup<MemoryStore> for BySlug {
            async fn find_record(
                &self,
                store: &MemoryStore,
                scope: &Scope,
                id: &str,
            ) -> Result<Option<Comment>, BoxError> {
                Ok(store
                    .list(scope)
                    .await?
                    .into_iter()
                    .find(|comment| comment.body == id))
            }
        }

        let controller =
            ResourceController::new(spec("Comments"), MemoryStore::with_post("1"), allowing())
                .with_lookup(BySlug);
        controller
            .dispatch(ActionRequest::new(Action::Create).parent("post", "1").attributes("hello".to_string()))
            .await
            .unwrap();

        let shown = controller
            .dispatch(ActionRequest::new(Action::Show).parent("post", "1").id("hello"))
            .await
            .unwrap();
        assert!(matches!(shown, ActionOutcome::Shown(ref comment) if comment.id == "1"));
    }
}
