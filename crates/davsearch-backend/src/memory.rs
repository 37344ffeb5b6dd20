//! In-memory backend.
//!
//! Holds containers and objects behind a single `RwLock`. Every read takes
//! one lock for the whole call, so a search sees a consistent snapshot even
//! while writers are active.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, trace};

use davsearch_core::{CalendarContainer, CalendarObject, ComponentTypes, ContainerRef, Principal};

use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, CalendarObjectStore, ContainerLister};

const BACKEND: &str = "memory";

#[derive(Debug, Default)]
struct MemoryState {
    containers: BTreeMap<ContainerRef, CalendarContainer>,
    /// Objects per container, keyed by URI.
    objects: BTreeMap<ContainerRef, BTreeMap<String, CalendarObject>>,
}

/// An in-memory container lister and object store.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Adds or replaces a container.
    pub async fn add_container(&self, container: CalendarContainer) {
        let reference = container.reference();
        let mut state = self.state.write().await;
        state.objects.entry(reference).or_default();
        state.containers.insert(reference, container);
        debug!(container = %reference, "Stored container");
    }

    /// Removes a container and all of its objects.
    pub async fn remove_container(&self, reference: ContainerRef) -> Option<CalendarContainer> {
        let mut state = self.state.write().await;
        state.objects.remove(&reference);
        state.containers.remove(&reference)
    }

    /// Inserts or replaces an object, keyed by `(container, uri)`.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the object's container does not exist.
    pub async fn put_object(&self, object: CalendarObject) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let Some(objects) = state.objects.get_mut(&object.container) else {
            return Err(StoreError::not_found(format!(
                "container {} does not exist",
                object.container
            ))
            .with_backend(BACKEND));
        };
        trace!(container = %object.container, uri = %object.uri, "Stored object");
        objects.insert(object.uri.clone(), object);
        Ok(())
    }

    /// Removes an object.
    pub async fn remove_object(&self, container: ContainerRef, uri: &str) -> Option<CalendarObject> {
        let mut state = self.state.write().await;
        state.objects.get_mut(&container)?.remove(uri)
    }

    /// Returns the number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.values().map(BTreeMap::len).sum()
    }

    /// Simulates the persistence layer going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable("store is offline").with_backend(BACKEND))
        }
    }
}

impl ContainerLister for MemoryStore {
    fn list_containers<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarContainer>>> {
        Box::pin(async move {
            self.check_available()?;
            let state = self.state.read().await;
            Ok(state
                .containers
                .values()
                .filter(|c| &c.principal == principal)
                .cloned()
                .collect())
        })
    }
}

impl CalendarObjectStore for MemoryStore {
    fn name(&self) -> &str {
        BACKEND
    }

    fn list_objects<'a>(
        &'a self,
        containers: &'a [ContainerRef],
        component_types: &'a ComponentTypes,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarObject>>> {
        Box::pin(async move {
            self.check_available()?;
            let state = self.state.read().await;

            let mut seen = std::collections::HashSet::new();
            let objects: Vec<CalendarObject> = containers
                .iter()
                .filter(|reference| seen.insert(**reference))
                .filter_map(|reference| state.objects.get(reference))
                .flat_map(BTreeMap::values)
                .filter(|object| component_types.contains(&object.component_type))
                .cloned()
                .collect();

            trace!(
                containers = containers.len(),
                types = %component_types,
                count = objects.len(),
                "Listed objects"
            );
            Ok(objects)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;
    use davsearch_core::ComponentType;

    fn alice() -> Principal {
        Principal::for_user("alice").unwrap()
    }

    fn object(container: ContainerRef, uri: &str, kind: ComponentType) -> CalendarObject {
        CalendarObject::new(container, uri, kind, "BEGIN:VCALENDAR\r\nEND:VCALENDAR")
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_container(CalendarContainer::calendar(1, "personal", alice()))
            .await;
        store
            .add_container(CalendarContainer::calendar(2, "other", Principal::for_user("bob").unwrap()))
            .await;
        store
            .put_object(object(ContainerRef::calendar(1), "a.ics", ComponentType::Event))
            .await
            .unwrap();
        store
            .put_object(object(ContainerRef::calendar(1), "b.ics", ComponentType::Todo))
            .await
            .unwrap();
        store
            .put_object(object(ContainerRef::calendar(2), "c.ics", ComponentType::Event))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn lists_only_the_principals_containers() {
        let store = seeded().await;
        let containers = store.list_containers(&alice()).await.unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].uri, "personal");
    }

    #[tokio::test]
    async fn filters_by_component_type() {
        let store = seeded().await;
        let events = ComponentTypes::single(ComponentType::Event);
        let objects = store
            .list_objects(&[ContainerRef::calendar(1)], &events)
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].uri, "a.ics");

        let journals = ComponentTypes::single(ComponentType::Journal);
        let objects = store
            .list_objects(&[ContainerRef::calendar(1)], &journals)
            .await
            .unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn repeated_and_unknown_references_are_harmless() {
        let store = seeded().await;
        let events = ComponentTypes::single(ComponentType::Event);
        let objects = store
            .list_objects(
                &[
                    ContainerRef::calendar(1),
                    ContainerRef::calendar(1),
                    ContainerRef::subscription(1),
                ],
                &events,
            )
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[tokio::test]
    async fn put_replaces_by_uri() {
        let store = seeded().await;
        store
            .put_object(
                object(ContainerRef::calendar(1), "a.ics", ComponentType::Event).with_etag("v2"),
            )
            .await
            .unwrap();
        assert_eq!(store.object_count().await, 3);

        let removed = store.remove_object(ContainerRef::calendar(1), "a.ics").await;
        assert_eq!(removed.and_then(|o| o.etag), Some("v2".to_string()));
        assert_eq!(store.object_count().await, 2);
    }

    #[tokio::test]
    async fn put_into_missing_container_fails() {
        let store = MemoryStore::new();
        let err = store
            .put_object(object(ContainerRef::calendar(7), "x.ics", ComponentType::Event))
            .await
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotFound);
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = seeded().await;
        store.set_available(false);
        assert!(store.list_containers(&alice()).await.unwrap_err().is_unavailable());

        store.set_available(true);
        assert!(store.list_containers(&alice()).await.is_ok());
    }

    #[tokio::test]
    async fn removing_a_container_drops_its_objects() {
        let store = seeded().await;
        assert!(store.remove_container(ContainerRef::calendar(1)).await.is_some());
        assert_eq!(store.object_count().await, 1);
        assert!(store.list_containers(&alice()).await.unwrap().is_empty());
    }
}
