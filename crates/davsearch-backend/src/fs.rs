//! Filesystem backend.
//!
//! Serves `.ics` files from a directory tree:
//!
//! ```text
//! <root>/<uid>/calendars/<calendar-uri>/<object>.ics
//! <root>/<uid>/subscriptions/<subscription-uri>/<object>.ics
//! ```
//!
//! Each container directory may hold a `container.toml` with
//! `display_name`, `order` and `read_only`. The tree is indexed when the
//! store is opened (component types are read once, there); object data is
//! read from disk on every search.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use davsearch_core::{
    CalendarContainer, CalendarObject, ComponentType, ComponentTypes, ContainerKind, ContainerRef,
    Principal,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, CalendarObjectStore, ContainerLister};

const BACKEND: &str = "fs";

/// Name of the optional per-container metadata file.
pub const CONTAINER_METADATA_FILE: &str = "container.toml";

/// Configuration for the filesystem backend.
#[derive(Debug, Clone)]
pub struct FsStoreConfig {
    /// Root directory of the tree.
    pub root: PathBuf,
    /// File extension of calendar objects.
    pub extension: String,
}

impl FsStoreConfig {
    /// Creates a configuration for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "ics".to_string(),
        }
    }

    /// Sets the calendar object file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Contents of `container.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContainerMetadata {
    display_name: Option<String>,
    order: i32,
    read_only: Option<bool>,
}

#[derive(Debug, Clone)]
struct IndexedObject {
    uri: String,
    component_type: ComponentType,
    path: PathBuf,
}

#[derive(Debug, Default)]
struct FsIndex {
    containers: Vec<CalendarContainer>,
    objects: BTreeMap<ContainerRef, Vec<IndexedObject>>,
}

impl FsIndex {
    fn object_count(&self) -> usize {
        self.objects.values().map(Vec::len).sum()
    }
}

/// A container lister and object store backed by a directory of `.ics` files.
#[derive(Debug)]
pub struct FsStore {
    config: FsStoreConfig,
    index: RwLock<FsIndex>,
}

impl FsStore {
    /// Opens the tree at `config.root` and indexes it.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the root cannot be read and `InvalidData` if
    /// a `container.toml` is malformed.
    pub async fn open(config: FsStoreConfig) -> StoreResult<Self> {
        let index = scan(&config).await?;
        info!(
            root = %config.root.display(),
            containers = index.containers.len(),
            objects = index.object_count(),
            "Indexed calendar tree"
        );
        Ok(Self {
            config,
            index: RwLock::new(index),
        })
    }

    /// Re-indexes the tree, picking up added or removed files.
    ///
    /// # Errors
    ///
    /// Same as [`FsStore::open`]; the previous index is kept on failure.
    pub async fn reload(&self) -> StoreResult<()> {
        let index = scan(&self.config).await?;
        debug!(
            containers = index.containers.len(),
            objects = index.object_count(),
            "Reloaded calendar tree"
        );
        *self.index.write().await = index;
        Ok(())
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.config.root
    }
}

impl ContainerLister for FsStore {
    fn list_containers<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarContainer>>> {
        Box::pin(async move {
            ensure_root(&self.config.root).await?;
            let index = self.index.read().await;
            Ok(index
                .containers
                .iter()
                .filter(|c| &c.principal == principal)
                .cloned()
                .collect())
        })
    }
}

impl CalendarObjectStore for FsStore {
    fn name(&self) -> &str {
        BACKEND
    }

    fn list_objects<'a>(
        &'a self,
        containers: &'a [ContainerRef],
        component_types: &'a ComponentTypes,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarObject>>> {
        Box::pin(async move {
            ensure_root(&self.config.root).await?;

            // Copy the entries out so no lock is held across file reads.
            let wanted: Vec<(ContainerRef, IndexedObject)> = {
                let index = self.index.read().await;
                let mut seen = HashSet::new();
                containers
                    .iter()
                    .filter(|reference| seen.insert(**reference))
                    .filter_map(|reference| {
                        index.objects.get(reference).map(|objects| (*reference, objects))
                    })
                    .flat_map(|(reference, objects)| {
                        objects
                            .iter()
                            .filter(|o| component_types.contains(&o.component_type))
                            .map(move |o| (reference, o.clone()))
                    })
                    .collect()
            };

            let mut objects = Vec::with_capacity(wanted.len());
            for (reference, entry) in wanted {
                if let Some(object) = read_object(reference, &entry).await? {
                    objects.push(object);
                }
            }
            Ok(objects)
        })
    }
}

async fn ensure_root(root: &Path) -> StoreResult<()> {
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unavailable(format!("{} is not a directory", root.display()))),
        Err(e) => Err(unavailable(format!("cannot access {}", root.display())).with_source(e)),
    }
}

async fn read_object(
    reference: ContainerRef,
    entry: &IndexedObject,
) -> StoreResult<Option<CalendarObject>> {
    let data = match tokio::fs::read_to_string(&entry.path).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // Deleted since the last scan.
            warn!(path = %entry.path.display(), "Calendar object vanished, skipping");
            return Ok(None);
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(path = %entry.path.display(), error = %e, "Unreadable calendar object, skipping");
            return Ok(None);
        }
        Err(e) => {
            return Err(
                unavailable(format!("failed to read {}", entry.path.display())).with_source(e)
            );
        }
    };

    let mut object = CalendarObject::new(
        reference,
        entry.uri.clone(),
        entry.component_type.clone(),
        data,
    );
    if let Ok(meta) = tokio::fs::metadata(&entry.path).await {
        if let Ok(modified) = meta.modified() {
            let modified: DateTime<Utc> = modified.into();
            object = object
                .with_etag(format!("\"{:x}-{:x}\"", modified.timestamp(), meta.len()))
                .with_last_modified(modified);
        }
    }
    Ok(Some(object))
}

fn unavailable(message: impl Into<String>) -> StoreError {
    StoreError::unavailable(message).with_backend(BACKEND)
}

/// Directory entries sorted by file name, split into directories and files.
async fn read_dir_sorted(path: &Path) -> io::Result<Vec<(String, PathBuf, bool)>> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            warn!(path = %entry.path().display(), "Skipping non UTF-8 path");
            continue;
        };
        let is_dir = entry.file_type().await?.is_dir();
        entries.push((name, entry.path(), is_dir));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

async fn scan(config: &FsStoreConfig) -> StoreResult<FsIndex> {
    ensure_root(&config.root).await?;
    let mut index = FsIndex::default();
    let mut next_id: BTreeMap<ContainerKind, i64> = BTreeMap::new();

    let principals = read_dir_sorted(&config.root)
        .await
        .map_err(|e| unavailable("failed to list root").with_source(e))?;

    for (uid, principal_dir, is_dir) in principals {
        if !is_dir {
            continue;
        }
        let Ok(principal) = Principal::for_user(&uid) else {
            warn!(uid = %uid, "Skipping directory that is not a valid user id");
            continue;
        };

        for (segment, kind) in [
            ("calendars", ContainerKind::Calendar),
            ("subscriptions", ContainerKind::Subscription),
        ] {
            let kind_dir = principal_dir.join(segment);
            let containers = match read_dir_sorted(&kind_dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(
                        unavailable(format!("failed to list {}", kind_dir.display()))
                            .with_source(e),
                    );
                }
            };

            for (uri, container_dir, is_dir) in containers {
                if !is_dir {
                    continue;
                }
                let id = next_id.entry(kind).or_insert(0);
                *id += 1;

                let container =
                    load_container(*id, kind, &uri, &container_dir, principal.clone()).await?;
                let objects = index_objects(config, &container_dir).await?;
                debug!(
                    principal = %principal,
                    container = %uri,
                    kind = %kind,
                    objects = objects.len(),
                    "Indexed container"
                );
                index.objects.insert(container.reference(), objects);
                index.containers.push(container);
            }
        }
    }

    Ok(index)
}

async fn load_container(
    id: i64,
    kind: ContainerKind,
    uri: &str,
    dir: &Path,
    principal: Principal,
) -> StoreResult<CalendarContainer> {
    let metadata_path = dir.join(CONTAINER_METADATA_FILE);
    let metadata = match tokio::fs::read_to_string(&metadata_path).await {
        Ok(content) => toml::from_str::<ContainerMetadata>(&content).map_err(|e| {
            StoreError::invalid_data(format!("malformed {}", metadata_path.display()))
                .with_backend(BACKEND)
                .with_source(e)
        })?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => ContainerMetadata::default(),
        Err(e) => {
            return Err(
                unavailable(format!("failed to read {}", metadata_path.display())).with_source(e)
            );
        }
    };

    let mut container = match kind {
        ContainerKind::Calendar => CalendarContainer::calendar(id, uri, principal),
        ContainerKind::Subscription => CalendarContainer::subscription(id, uri, principal),
    }
    .with_order(metadata.order);

    if let Some(name) = metadata.display_name {
        container = container.with_display_name(name);
    }
    if let Some(read_only) = metadata.read_only {
        container = container.with_read_only(read_only);
    }
    Ok(container)
}

async fn index_objects(config: &FsStoreConfig, dir: &Path) -> StoreResult<Vec<IndexedObject>> {
    let entries = read_dir_sorted(dir)
        .await
        .map_err(|e| unavailable(format!("failed to list {}", dir.display())).with_source(e))?;

    let mut objects = Vec::new();
    for (name, path, is_dir) in entries {
        let is_object = !is_dir
            && Path::new(&name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&config.extension));
        if !is_object {
            continue;
        }

        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable calendar object, skipping");
                continue;
            }
        };
        // The container ref is irrelevant here; only the component type is kept.
        match CalendarObject::from_ics(ContainerRef::calendar(0), name.clone(), data) {
            Ok(object) => objects.push(IndexedObject {
                uri: name,
                component_type: object.component_type,
                path,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unparseable calendar object, skipping");
            }
        }
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;

    fn event(uid: &str, summary: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART:20250205T100000Z\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
        )
    }

    fn todo(uid: &str, summary: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTODO\r\nUID:{uid}\r\nSUMMARY:{summary}\r\nEND:VTODO\r\nEND:VCALENDAR\r\n"
        )
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("alice/calendars/work/standup.ics"), &event("s", "Standup"));
        write(&root.join("alice/calendars/work/chores.ics"), &todo("c", "Chores"));
        write(&root.join("alice/calendars/work/notes.txt"), "not a calendar");
        write(&root.join("alice/calendars/work/broken.ics"), "BEGIN:VCALENDAR\r\nthis is not");
        write(
            &root.join("alice/calendars/work/container.toml"),
            "display_name = \"Work\"\norder = 2\n",
        );
        write(&root.join("alice/calendars/home/dinner.ics"), &event("d", "Dinner"));
        write(&root.join("alice/subscriptions/holidays/xmas.ics"), &event("x", "Christmas"));
        write(&root.join("bob/calendars/personal/gym.ics"), &event("g", "Gym"));
        dir
    }

    #[tokio::test]
    async fn indexes_containers_per_principal() {
        let dir = tree();
        let store = FsStore::open(FsStoreConfig::new(dir.path())).await.unwrap();

        let alice = Principal::for_user("alice").unwrap();
        let containers = store.list_containers(&alice).await.unwrap();
        let summary: Vec<_> = containers
            .iter()
            .map(|c| (c.uri.as_str(), c.reference(), c.order, c.read_only))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("home", ContainerRef::calendar(1), 0, false),
                ("work", ContainerRef::calendar(2), 2, false),
                ("holidays", ContainerRef::subscription(1), 0, true),
            ]
        );
        assert_eq!(containers[1].display_name.as_deref(), Some("Work"));
    }

    #[tokio::test]
    async fn lists_objects_by_type_and_skips_garbage() {
        let dir = tree();
        let store = FsStore::open(FsStoreConfig::new(dir.path())).await.unwrap();
        let work = [ContainerRef::calendar(2)];

        let events = store
            .list_objects(&work, &ComponentTypes::single(ComponentType::Event))
            .await
            .unwrap();
        let uris: Vec<_> = events.iter().map(|o| o.uri.as_str()).collect();
        assert_eq!(uris, vec!["standup.ics"]);
        assert!(events[0].etag.is_some());
        assert!(events[0].calendar_data.contains("SUMMARY:Standup"));

        let todos = store
            .list_objects(&work, &ComponentTypes::single(ComponentType::Todo))
            .await
            .unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].component_type, ComponentType::Todo);
    }

    #[tokio::test]
    async fn vanished_files_are_skipped() {
        let dir = tree();
        let store = FsStore::open(FsStoreConfig::new(dir.path())).await.unwrap();
        std::fs::remove_file(dir.path().join("alice/calendars/home/dinner.ics")).unwrap();

        let objects = store
            .list_objects(
                &[ContainerRef::calendar(1)],
                &ComponentTypes::single(ComponentType::Event),
            )
            .await
            .unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn files_turned_binary_are_skipped() {
        let dir = tree();
        let store = FsStore::open(FsStoreConfig::new(dir.path())).await.unwrap();
        std::fs::write(
            dir.path().join("alice/calendars/work/standup.ics"),
            [0xff, 0xfe, 0x00, 0x42],
        )
        .unwrap();

        let objects = store
            .list_objects(
                &[ContainerRef::calendar(1), ContainerRef::calendar(2)],
                &ComponentTypes::single(ComponentType::Event),
            )
            .await
            .unwrap();
        let uris: Vec<_> = objects.iter().map(|o| o.uri.as_str()).collect();
        assert_eq!(uris, vec!["dinner.ics"]);
    }

    #[tokio::test]
    async fn reload_picks_up_new_files() {
        let dir = tree();
        let store = FsStore::open(FsStoreConfig::new(dir.path())).await.unwrap();
        write(&dir.path().join("alice/calendars/home/lunch.ics"), &event("l", "Lunch"));
        store.reload().await.unwrap();

        let objects = store
            .list_objects(
                &[ContainerRef::calendar(1)],
                &ComponentTypes::single(ComponentType::Event),
            )
            .await
            .unwrap();
        assert_eq!(objects.len(), 2);
    }

    #[tokio::test]
    async fn missing_root_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = FsStore::open(FsStoreConfig::new(&missing)).await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Unavailable);
    }

    #[tokio::test]
    async fn root_removed_after_open_is_unavailable() {
        let dir = tree();
        let root = dir.path().to_path_buf();
        let store = FsStore::open(FsStoreConfig::new(&root)).await.unwrap();
        drop(dir);

        let alice = Principal::for_user("alice").unwrap();
        assert!(store.list_containers(&alice).await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn malformed_metadata_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("alice/calendars/work/container.toml"),
            "order = \"first\"",
        );
        let err = FsStore::open(FsStoreConfig::new(dir.path())).await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::InvalidData);
    }
}
