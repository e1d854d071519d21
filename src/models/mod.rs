//! 数据模型层

pub mod console;
pub mod edit_history;
pub mod file_tree;
pub mod project;

pub use console::{ConsoleBuffer, ConsoleLevel, ConsoleRecord};
pub use edit_history::{EditHistory, HistoryEntry};
pub use file_tree::{build_tree, TreeNode, TreeRow};
pub use project::{extension_of, normalize_path, ProjectFile, Snapshot, VirtualProject};
