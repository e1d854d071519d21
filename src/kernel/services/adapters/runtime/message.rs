use crate::kernel::preview::{BuildError, BuildOutput};
use crate::kernel::services::ports::{EditResponse, FileError, GeneratorError};
use crate::kernel::Action;
use crate::models::Snapshot;
use std::path::PathBuf;

pub enum AppMessage {
    BuildFinished {
        generation: u64,
        result: Result<BuildOutput, BuildError>,
    },
    ProjectLoaded {
        root: PathBuf,
        snapshot: Snapshot,
    },
    DirectorySaved {
        root: PathBuf,
        files: usize,
    },
    FileOpFailed(FileError),
    Persisted {
        key: String,
    },
    PersistFailed {
        key: String,
        error: String,
    },
    Generated(Result<Snapshot, GeneratorError>),
    Edited(Result<EditResponse, GeneratorError>),
}

impl AppMessage {
    /// 转成 store 可处理的 action；纯通知类消息返回 None
    pub fn into_action(self) -> Option<Action> {
        match self {
            AppMessage::BuildFinished { generation, result } => {
                Some(Action::BuildFinished { generation, result })
            }
            AppMessage::ProjectLoaded { root, snapshot } => Some(Action::LoadProject {
                snapshot,
                external_root: Some(root),
            }),
            AppMessage::DirectorySaved { root, files } => Some(Action::Notify(format!(
                "Saved {} file(s) to {}",
                files,
                root.display()
            ))),
            AppMessage::FileOpFailed(error) => Some(Action::FileOpFailed(error)),
            AppMessage::Persisted { .. } => None,
            AppMessage::PersistFailed { error, .. } => {
                Some(Action::PersistFailed { message: error })
            }
            AppMessage::Generated(Ok(snapshot)) => Some(Action::LoadProject {
                snapshot,
                external_root: None,
            }),
            AppMessage::Edited(Ok(response)) => Some(Action::ApplyBatch {
                files: response.changed_files,
                summary: Some(response.summary),
            }),
            AppMessage::Generated(Err(error)) | AppMessage::Edited(Err(error)) => {
                Some(Action::Notify(error.to_string()))
            }
        }
    }
}
