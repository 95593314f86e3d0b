//! Collaborator traits for resource controllers

use super::{BoxError, Capability, ParentRef, Scope};
use async_trait::async_trait;

/// Persistence collaborator for one resource type
///
/// Every operation receives the request [`Scope`], so nested resources can
/// restrict queries to their parent record.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persisted record
    type Record: Send + Sync + 'static;

    /// Submitted attributes for `create` and `update`
    type Attributes: Send + 'static;

    /// Records in scope
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn list(&self, scope: &Scope) -> Result<Vec<Self::Record>, BoxError>;

    /// A new, unsaved record for a `new` form
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn build(&self, scope: &Scope) -> Result<Self::Record, BoxError>;

    /// The record `id` in scope, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn find(&self, scope: &Scope, id: &str) -> Result<Option<Self::Record>, BoxError>;

    /// The single record of a singular resource in scope
    ///
    /// Defaults to the first record listed in scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn find_singleton(&self, scope: &Scope) -> Result<Option<Self::Record>, BoxError> {
        Ok(self.list(scope).await?.into_iter().next())
    }

    /// Whether the ancestor `parent` exists
    ///
    /// Defaults to `true` for stores that cannot see their parents' records.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn parent_exists(&self, _scope: &Scope, _parent: &ParentRef) -> Result<bool, BoxError> {
        Ok(true)
    }

    /// Persist a new record
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes are rejected or the backend fails.
    async fn create(
        &self,
        scope: &Scope,
        attributes: Self::Attributes,
    ) -> Result<Self::Record, BoxError>;

    /// Apply attributes to a loaded record
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes are rejected or the backend fails.
    async fn update(
        &self,
        scope: &Scope,
        record: Self::Record,
        attributes: Self::Attributes,
    ) -> Result<Self::Record, BoxError>;

    /// Remove a loaded record
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn destroy(&self, scope: &Scope, record: Self::Record) -> Result<(), BoxError>;
}

/// Policy collaborator consulted before every action
///
/// Returning `Ok(false)` denies the action; an error means no decision could
/// be made.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decide whether `capability` is allowed
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot be evaluated.
    async fn authorize(&self, capability: &Capability) -> Result<bool, BoxError>;
}

/// Authorizer that allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, _capability: &Capability) -> Result<bool, BoxError> {
        Ok(true)
    }
}

/// Overridable record identification
///
/// The defaults delegate to the store. Override a method to identify records
/// differently, for example by slug or through the current user.
#[async_trait]
pub trait ResourceLookup<S: ResourceStore>: Send + Sync {
    /// Load the record addressed by a member action
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn find_record(
        &self,
        store: &S,
        scope: &Scope,
        id: &str,
    ) -> Result<Option<S::Record>, BoxError> {
        store.find(scope, id).await
    }

    /// Load the record of a singular resource
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn find_singleton(&self, store: &S, scope: &Scope) -> Result<Option<S::Record>, BoxError> {
        store.find_singleton(scope).await
    }

    /// Check that the innermost ancestor exists
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn find_parent(
        &self,
        store: &S,
        scope: &Scope,
        parent: &ParentRef,
    ) -> Result<bool, BoxError> {
        store.parent_exists(&scope.enclosing(), parent).await
    }
}

/// Lookup using the store's defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLookup;

#[async_trait]
impl<S: ResourceStore> ResourceLookup<S> for DefaultLookup {}
