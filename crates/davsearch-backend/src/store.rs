//! Backend trait definitions.
//!
//! The search engine talks to persistence through two traits:
//!
//! - [`ContainerLister`] resolves the calendars and subscriptions a
//!   principal can see.
//! - [`CalendarObjectStore`] returns the objects of a set of containers,
//!   already filtered by component type.
//!
//! Both are read-only and `Send + Sync`, so one backend can serve
//! concurrent searches.

use std::future::Future;
use std::pin::Pin;

use davsearch_core::{CalendarContainer, CalendarObject, ComponentTypes, ContainerRef, Principal};

use crate::error::{StoreError, StoreResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe, so the engine can hold a
/// `dyn CalendarObjectStore`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Lists the containers visible to a principal.
pub trait ContainerLister: Send + Sync {
    /// Returns every calendar and subscription of `principal`.
    ///
    /// Order is unspecified; callers sort by display order themselves.
    ///
    /// # Errors
    ///
    /// Returns an `Unavailable` error if the backend cannot be reached.
    fn list_containers<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarContainer>>>;
}

/// Read access to stored calendar objects.
///
/// # Implementation Notes
///
/// - Objects whose component type is not in `component_types` must not be
///   returned (and should not be loaded at all when avoidable).
/// - A single call must not return the same object twice, even when writes
///   happen concurrently.
/// - Unknown container references are skipped, not reported.
/// - No retries; report the failure and let the caller decide.
pub trait CalendarObjectStore: Send + Sync {
    /// Returns the name of this backend (e.g. "memory", "fs").
    fn name(&self) -> &str;

    /// Lists the objects of `containers` whose component type is in
    /// `component_types`.
    ///
    /// # Errors
    ///
    /// Returns an `Unavailable` error if the backend cannot be reached.
    fn list_objects<'a>(
        &'a self,
        containers: &'a [ContainerRef],
        component_types: &'a ComponentTypes,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarObject>>>;
}

impl<T: ContainerLister + ?Sized> ContainerLister for std::sync::Arc<T> {
    fn list_containers<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarContainer>>> {
        (**self).list_containers(principal)
    }
}

impl<T: CalendarObjectStore + ?Sized> CalendarObjectStore for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_objects<'a>(
        &'a self,
        containers: &'a [ContainerRef],
        component_types: &'a ComponentTypes,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarObject>>> {
        (**self).list_objects(containers, component_types)
    }
}

/// A backend that always fails.
///
/// Useful in tests and as a placeholder when the configured backend cannot
/// be initialised.
#[derive(Debug)]
pub struct ErrorStore {
    name: String,
    error: StoreError,
}

impl ErrorStore {
    /// Creates a new error store.
    pub fn new(name: impl Into<String>, error: StoreError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> StoreError {
        StoreError::new(self.error.code(), self.error.message()).with_backend(&self.name)
    }
}

impl ContainerLister for ErrorStore {
    fn list_containers<'a>(
        &'a self,
        _principal: &'a Principal,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarContainer>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}

impl CalendarObjectStore for ErrorStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_objects<'a>(
        &'a self,
        _containers: &'a [ContainerRef],
        _component_types: &'a ComponentTypes,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarObject>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;
    use davsearch_core::ComponentType;

    #[tokio::test]
    async fn error_store_fails_every_call() {
        let store = ErrorStore::new("broken", StoreError::unavailable("offline"));
        let principal = Principal::for_user("alice").unwrap();

        let err = store.list_containers(&principal).await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Unavailable);
        assert_eq!(err.backend(), Some("broken"));

        let types = ComponentTypes::single(ComponentType::Event);
        let err = store
            .list_objects(&[ContainerRef::calendar(1)], &types)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(store.name(), "broken");
    }

    #[tokio::test]
    async fn arc_delegates() {
        let store = std::sync::Arc::new(ErrorStore::new("shared", StoreError::internal("bug")));
        assert_eq!(CalendarObjectStore::name(&store), "shared");
        let principal = Principal::for_user("alice").unwrap();
        assert!(store.list_containers(&principal).await.is_err());
    }
}
