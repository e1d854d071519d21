use std::path::PathBuf;
use std::time::Instant;

use crate::kernel::preview::{BuildError, BuildOutput, DeviceMode};
use crate::kernel::services::ports::{FileError, SavedSession};
use crate::models::{ConsoleRecord, ProjectFile, Snapshot};

#[derive(Debug)]
pub enum Action {
    /// 打开目录或生成新项目；旧项目与历史全部丢弃
    LoadProject {
        snapshot: Snapshot,
        external_root: Option<PathBuf>,
    },
    ResetProject,
    /// 启动时恢复上次自动保存的会话
    Restore(SavedSession),
    SetActiveFile(Option<String>),
    /// 逐键编辑：立即更新内容，延迟提交历史
    EditFile {
        path: String,
        content: String,
        now: Instant,
    },
    /// AI 批量编辑：整文件替换并立即提交历史
    ApplyBatch {
        files: Vec<ProjectFile>,
        summary: Option<String>,
    },
    Undo,
    Redo,
    KeyChord(String),
    Tick {
        now: Instant,
    },
    BuildFinished {
        generation: u64,
        result: Result<BuildOutput, BuildError>,
    },
    Console(ConsoleRecord),
    ToggleFolder(String),
    SetDevice(DeviceMode),
    SaveToDirectory,
    FileOpFailed(FileError),
    PersistFailed {
        message: String,
    },
    Notify(String),
    DismissNotice,
}
