use rustc_hash::FxHashSet;
use std::time::{Duration, Instant};

use crate::kernel::debounce::CommitDebouncer;
use crate::kernel::keymap::Keymap;
use crate::kernel::preview::{BuildError, DeviceMode, PreviewDocument};
use crate::kernel::services::ports::PreviewConfig;
use crate::models::{build_tree, ConsoleBuffer, EditHistory, TreeNode, TreeRow, VirtualProject};

/// 预览面板：最近一次成功的文档与最近一次构建的结果
#[derive(Debug, Default)]
pub struct PreviewPane {
    pub document: Option<PreviewDocument>,
    /// 没有入口文件
    pub empty: bool,
    pub build_error: Option<BuildError>,
    /// 构建失败时仍显示旧文档，但标记为过期
    pub stale: bool,
    /// 已应用的最新 generation
    pub generation: u64,
    pub device: DeviceMode,
}

impl PreviewPane {
    pub fn error_message(&self) -> Option<&str> {
        self.build_error.as_ref().map(BuildError::message)
    }
}

#[derive(Debug)]
pub struct AutosaveState {
    pub interval: Duration,
    pub key: String,
    pub next_due: Option<Instant>,
    /// 最近一次写出的项目 revision
    pub saved_revision: Option<u64>,
}

#[derive(Debug)]
pub struct PreviewState {
    pub project: VirtualProject,
    pub tree: TreeNode,
    pub expanded: FxHashSet<String>,
    pub active_file: Option<String>,
    pub history: EditHistory,
    pub debouncer: CommitDebouncer,
    pub preview: PreviewPane,
    pub console: ConsoleBuffer,
    pub notice: Option<String>,
    pub keymap: Keymap,
    pub autosave: AutosaveState,
}

impl PreviewState {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            project: VirtualProject::new(),
            tree: TreeNode::default(),
            expanded: FxHashSet::default(),
            active_file: None,
            history: EditHistory::new(),
            debouncer: CommitDebouncer::new(config.history_debounce()),
            preview: PreviewPane::default(),
            console: ConsoleBuffer::new(),
            notice: None,
            keymap: Keymap::with_rules(&config.keybindings),
            autosave: AutosaveState {
                interval: config.autosave_interval(),
                key: config.autosave_key.clone(),
                next_due: None,
                saved_revision: None,
            },
        }
    }

    pub fn active_content(&self) -> Option<&str> {
        self.project.get(self.active_file.as_deref()?)
    }

    pub fn tree_rows(&self) -> Vec<TreeRow> {
        self.tree.flatten_for_view(&self.expanded)
    }

    pub fn rebuild_tree(&mut self) {
        self.tree = build_tree(self.project.paths());
        let tree = &self.tree;
        self.expanded.retain(|path| tree.find(path).is_some_and(|n| !n.is_leaf()));
    }

    pub fn can_undo(&self) -> bool {
        self.active_file
            .as_deref()
            .is_some_and(|path| self.history.can_undo(path) || self.debouncer.is_pending(path))
    }

    pub fn can_redo(&self) -> bool {
        self.active_file
            .as_deref()
            .is_some_and(|path| self.history.can_redo(path) && !self.debouncer.is_pending(path))
    }
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::new(&PreviewConfig::default())
    }
}
