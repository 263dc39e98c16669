//! Task list state driven by a pure reducer, persisted to an async
//! key-value store after every change.

mod command;
mod error;
mod id;
mod persistence;
mod storage;
mod store;
mod task;
mod validate;
mod view;

pub use command::{TaskCommand, UiEvent};
pub use error::{LoadError, ParseFilterError, ShapeError, StorageError, WriterGone};
pub use id::{Clock, IdGenerator, system_clock};
pub use persistence::{DEFAULT_STORAGE_KEY, PersistenceBridge, SaveHandle};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{TaskStore, TaskStoreBuilder};
pub use task::{Task, TaskEvent, TaskField, TaskId, TaskList};
pub use validate::validate_tasks;
pub use view::{Filter, TaskView, render, visible};
