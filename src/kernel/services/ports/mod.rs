//! Service ports: traits + data contracts.

pub mod config;
pub mod file;
pub mod generator;
pub mod resources;
pub mod runtime;
pub mod storage;

pub use config::{EntryPolicy, KeybindingRule, PreviewConfig};
pub use file::{FileError, ProjectDirectory, Result as FileResult};
pub use generator::{
    ChatRole, ChatTurn, EditRequest, EditResponse, GeneratorError, ProjectGenerator,
};
pub use resources::{BlobStore, MIME_CSS, MIME_JAVASCRIPT};
pub use runtime::{AsyncExecutor, BoxFuture};
pub use storage::{KeyValueStore, SavedSession, StorageError};
