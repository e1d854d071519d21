//! 项目目录访问 Provider trait
//!
//! 抽象真实文件系统上的项目读写，供"打开文件夹 / 保存到文件夹"使用

use crate::models::Snapshot;
use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug)]
pub enum FileError {
    Io(io::Error),
    NotFound(PathBuf),
    PermissionDenied(PathBuf),
    NotADirectory(PathBuf),
    /// 用户取消了目录选择，调用方应静默忽略
    Cancelled,
}

impl FileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FileError::Cancelled)
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "IO error: {}", e),
            FileError::NotFound(p) => write!(f, "Not found: {}", p.display()),
            FileError::PermissionDenied(p) => write!(f, "Permission denied: {}", p.display()),
            FileError::NotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            FileError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for FileError {}

impl From<io::Error> for FileError {
    fn from(e: io::Error) -> Self {
        FileError::Io(e)
    }
}

pub trait ProjectDirectory: Send + Sync {
    /// 递归读取目录中的文本文件，返回以 `/` 分隔的相对路径快照
    fn load(&self, root: &Path) -> Result<Snapshot>;

    /// 把快照写回目录，按需创建中间目录；返回写入的文件数
    fn save(&self, root: &Path, snapshot: &Snapshot) -> Result<usize>;
}
