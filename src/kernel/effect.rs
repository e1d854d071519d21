use std::path::PathBuf;

use crate::kernel::preview::PreviewDocument;
use crate::kernel::services::ports::SavedSession;
use crate::models::Snapshot;

#[derive(Debug, Clone)]
pub enum Effect {
    /// 快照发生变化，需要重新构建预览
    Rebuild { snapshot: Snapshot },
    /// 写入自动保存
    Persist { session: SavedSession },
    /// 新文档可以交给渲染器
    Render(PreviewDocument),
    WriteDirectory { root: PathBuf, snapshot: Snapshot },
}
