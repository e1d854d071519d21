//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod app_dirs;
pub mod config;
pub mod file;
pub mod resources;
pub mod runtime;
pub mod settings;
pub mod storage;

pub use app_dirs::{ensure_log_dir, ensure_storage_dir, get_log_dir, get_storage_dir};
pub use config::ConfigService;
pub use file::{is_likely_binary, should_ignore, LocalProjectProvider};
pub use resources::{DataUriStore, MemoryBlobStore};
pub use runtime::{AppMessage, PreviewRuntime};
pub use settings::{ensure_settings_file, get_settings_path, load_settings};
pub use storage::{JsonFileStore, MemoryStore};
