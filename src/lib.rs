//! To-do list state: tasks, subtasks, filtered/sorted views, and
//! fire-and-forget persistence to local key-value storage.

pub mod codec;
pub mod gateway;
pub mod model;
pub mod persist;
#[cfg(feature = "profile")]
pub mod profile;
pub mod settings;
pub mod store;
pub mod view;
mod writer;

pub use gateway::{MemoryGateway, PersistError, PersistenceGateway};
pub use model::{Priority, Subtask, Task, TaskId};
pub use persist::SaveFile;
pub use settings::{Settings, SettingsError};
pub use store::{Command, Event, NoOp, Snapshot, TaskStore};
pub use view::{view, Filter, SortMode};
