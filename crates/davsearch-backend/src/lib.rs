//! Storage backends for calendar search
//!
//! The engine reads through two traits, [`ContainerLister`] and
//! [`CalendarObjectStore`]. Three implementations ship here:
//!
//! - [`MemoryStore`] - lock-guarded maps, used by tests and embedders
//! - [`FsStore`] - a directory tree of `.ics` files
//! - [`ErrorStore`] - fails every call with a fixed error

pub mod error;
pub mod fs;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use fs::{FsStore, FsStoreConfig};
pub use memory::MemoryStore;
pub use store::{BoxFuture, CalendarObjectStore, ContainerLister, ErrorStore};
