use std::time::Instant;

use super::keymap::HistoryCommand;
use super::{Action, Effect, PreviewState};
use crate::kernel::preview::{BuildError, BuildOutput};
use crate::kernel::services::ports::{FileError, SavedSession};
use crate::models::{normalize_path, ConsoleRecord, ProjectFile, Snapshot};

pub struct DispatchResult {
    pub effects: Vec<Effect>,
    pub state_changed: bool,
}

impl DispatchResult {
    fn unchanged() -> Self {
        Self {
            effects: Vec::new(),
            state_changed: false,
        }
    }

    fn changed() -> Self {
        Self {
            effects: Vec::new(),
            state_changed: true,
        }
    }

    fn with_effects(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            state_changed: true,
        }
    }
}

pub struct Store {
    state: PreviewState,
}

impl Store {
    pub fn new(state: PreviewState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        match action {
            Action::LoadProject {
                snapshot,
                external_root,
            } => self.load_project(snapshot, external_root),
            Action::ResetProject => {
                self.state.project.reset();
                self.state.history.clear();
                self.state.debouncer.clear();
                self.state.active_file = None;
                self.state.expanded.clear();
                self.state.rebuild_tree();
                tracing::info!("project reset");
                DispatchResult::with_effects(vec![self.rebuild()])
            }
            Action::Restore(session) => self.restore(session),
            Action::SetActiveFile(path) => {
                let path = path
                    .map(|p| normalize_path(&p))
                    .filter(|p| self.state.project.contains(p));
                if path == self.state.active_file {
                    return DispatchResult::unchanged();
                }
                self.state.active_file = path;
                DispatchResult::changed()
            }
            Action::EditFile { path, content, now } => self.edit_file(&path, content, now),
            Action::ApplyBatch { files, summary } => self.apply_batch(&files, summary),
            Action::Undo => self.step_history(HistoryCommand::Undo),
            Action::Redo => self.step_history(HistoryCommand::Redo),
            Action::KeyChord(chord) => match self.state.keymap.resolve(&chord) {
                Some(command) => self.step_history(command),
                None => DispatchResult::unchanged(),
            },
            Action::Tick { now } => self.tick(now),
            Action::BuildFinished { generation, result } => self.build_finished(generation, result),
            Action::Console(record) => {
                self.state.console.push(record);
                DispatchResult::changed()
            }
            Action::ToggleFolder(path) => {
                let is_dir = self.state.tree.find(&path).is_some_and(|n| !n.is_leaf());
                if !is_dir {
                    return DispatchResult::unchanged();
                }
                if !self.state.expanded.remove(&path) {
                    self.state.expanded.insert(path);
                }
                DispatchResult::changed()
            }
            Action::SetDevice(device) => {
                if self.state.preview.device == device {
                    return DispatchResult::unchanged();
                }
                self.state.preview.device = device;
                DispatchResult::changed()
            }
            Action::SaveToDirectory => {
                let Some(root) = self.state.project.external_root().map(|p| p.to_path_buf())
                else {
                    return self.notify("No folder is open; nothing to save to".to_string());
                };
                DispatchResult {
                    effects: vec![Effect::WriteDirectory {
                        root,
                        snapshot: self.state.project.snapshot(),
                    }],
                    state_changed: false,
                }
            }
            Action::FileOpFailed(error) => self.file_op_failed(error),
            Action::PersistFailed { message } => {
                tracing::warn!(error = %message, "autosave failed");
                self.state.autosave.saved_revision = None;
                DispatchResult::unchanged()
            }
            Action::Notify(message) => self.notify(message),
            Action::DismissNotice => DispatchResult {
                effects: Vec::new(),
                state_changed: self.state.notice.take().is_some(),
            },
        }
    }

    fn rebuild(&self) -> Effect {
        Effect::Rebuild {
            snapshot: self.state.project.snapshot(),
        }
    }

    fn notify(&mut self, message: String) -> DispatchResult {
        self.state.notice = Some(message);
        DispatchResult::changed()
    }

    fn load_project(
        &mut self,
        snapshot: Snapshot,
        external_root: Option<std::path::PathBuf>,
    ) -> DispatchResult {
        self.state.project.replace_all(snapshot);
        self.state.project.bind_external(external_root);
        self.state.history.clear();
        self.state.debouncer.clear();
        self.state.expanded.clear();
        self.state.rebuild_tree();

        let keep_active = self
            .state
            .active_file
            .as_deref()
            .is_some_and(|p| self.state.project.contains(p));
        if !keep_active {
            self.state.active_file = self.default_active_file();
        }
        tracing::info!(
            files = self.state.project.len(),
            external = self.state.project.external_root().is_some(),
            "project loaded"
        );
        DispatchResult::with_effects(vec![self.rebuild()])
    }

    fn restore(&mut self, session: SavedSession) -> DispatchResult {
        let count = session.files.len();
        self.state.project.replace_all(session.files);
        self.state.project.bind_external(None);
        self.state.history.clear();
        self.state.debouncer.clear();
        self.state.rebuild_tree();
        self.state.active_file = session
            .active_file
            .filter(|p| self.state.project.contains(p))
            .or_else(|| self.default_active_file());
        // 刚恢复的内容不需要立刻写回
        self.state.autosave.saved_revision = Some(self.state.project.revision());
        self.state.console.push(ConsoleRecord::system(format!(
            "Restored {} file(s) from the previous session",
            count
        )));
        tracing::info!(files = count, "session restored");
        DispatchResult::with_effects(vec![self.rebuild()])
    }

    /// 入口文件优先，否则取第一个文件
    fn default_active_file(&self) -> Option<String> {
        let paths = self.state.project.paths();
        crate::kernel::preview::find_entry(
            paths,
            crate::kernel::services::ports::EntryPolicy::Loose,
        )
        .or_else(|| self.state.project.paths().next())
        .map(str::to_string)
    }

    fn edit_file(&mut self, path: &str, content: String, now: Instant) -> DispatchResult {
        let path = normalize_path(path);
        if path.is_empty() {
            return DispatchResult::unchanged();
        }
        let is_new = !self.state.project.contains(&path);
        let baseline = self.state.project.get(&path).unwrap_or_default().to_string();
        if !self.state.project.write(&path, content) {
            return DispatchResult::unchanged();
        }

        self.state.history.seed(&path, &baseline);
        self.state.debouncer.schedule(&path, now);
        if is_new {
            self.state.rebuild_tree();
        }
        if self.state.active_file.is_none() {
            self.state.active_file = Some(path);
        }
        DispatchResult::with_effects(vec![self.rebuild()])
    }

    fn apply_batch(&mut self, files: &[ProjectFile], summary: Option<String>) -> DispatchResult {
        let mut changed = Vec::new();
        let mut added = false;
        for file in files {
            let path = normalize_path(&file.path);
            if path.is_empty() {
                continue;
            }
            self.flush_pending(&path);
            let previous = self.state.project.get(&path).map(str::to_string);
            if !self.state.project.write(&path, file.content.as_str()) {
                continue;
            }
            added |= previous.is_none();
            self.state
                .history
                .seed(&path, previous.as_deref().unwrap_or_default());
            self.state.history.commit(&path, &file.content);
            changed.push(path);
        }

        if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
            self.state.console.push(ConsoleRecord::system(summary));
        }
        if changed.is_empty() {
            return DispatchResult::changed();
        }
        if added {
            self.state.rebuild_tree();
        }
        tracing::info!(files = changed.len(), "batch edit applied");
        DispatchResult::with_effects(vec![self.rebuild()])
    }

    /// 把尚未到期的逐键编辑立即提交
    fn flush_pending(&mut self, path: &str) {
        if !self.state.debouncer.cancel(path) {
            return;
        }
        if let Some(content) = self.state.project.get(path) {
            let content = content.to_string();
            self.state.history.commit(path, &content);
        }
    }

    fn step_history(&mut self, command: HistoryCommand) -> DispatchResult {
        let Some(path) = self.state.active_file.clone() else {
            return DispatchResult::unchanged();
        };
        self.flush_pending(&path);

        let restored = match command {
            HistoryCommand::Undo => self.state.history.undo(&path),
            HistoryCommand::Redo => self.state.history.redo(&path),
        };
        let Some(content) = restored else {
            return DispatchResult::unchanged();
        };
        if !self.state.project.write(&path, content) {
            return DispatchResult::changed();
        }
        DispatchResult::with_effects(vec![self.rebuild()])
    }

    fn tick(&mut self, now: Instant) -> DispatchResult {
        let mut state_changed = false;
        for path in self.state.debouncer.take_due(now) {
            if let Some(content) = self.state.project.get(&path) {
                let content = content.to_string();
                state_changed |= self.state.history.commit(&path, &content);
            }
        }

        let mut effects = Vec::new();
        let autosave = &mut self.state.autosave;
        match autosave.next_due {
            None => autosave.next_due = Some(now + autosave.interval),
            Some(due) if now >= due => {
                autosave.next_due = Some(now + autosave.interval);
                let revision = self.state.project.revision();
                let dirty = autosave.saved_revision != Some(revision);
                if dirty && self.state.project.external_root().is_none() {
                    autosave.saved_revision = Some(revision);
                    effects.push(Effect::Persist {
                        session: SavedSession::new(
                            self.state.project.snapshot(),
                            self.state.active_file.clone(),
                        ),
                    });
                }
            }
            Some(_) => {}
        }

        DispatchResult {
            effects,
            state_changed,
        }
    }

    fn build_finished(
        &mut self,
        generation: u64,
        result: Result<BuildOutput, BuildError>,
    ) -> DispatchResult {
        let pane = &mut self.state.preview;
        if generation < pane.generation {
            tracing::debug!(generation, current = pane.generation, "ignoring stale build result");
            return DispatchResult::unchanged();
        }

        match result {
            Ok(BuildOutput::Superseded { .. }) => DispatchResult::unchanged(),
            Ok(BuildOutput::Empty { .. }) => {
                pane.generation = generation;
                pane.document = None;
                pane.empty = true;
                pane.build_error = None;
                pane.stale = false;
                DispatchResult::changed()
            }
            Ok(BuildOutput::Document(document)) => {
                pane.generation = generation;
                pane.document = Some(document.clone());
                pane.empty = false;
                pane.build_error = None;
                pane.stale = false;
                // 新文档重新执行，旧输出不再相关
                self.state.console.push(ConsoleRecord::clear());
                DispatchResult::with_effects(vec![Effect::Render(document)])
            }
            Err(error) => {
                tracing::warn!(generation, error = %error, "build failed");
                pane.generation = generation;
                pane.stale = pane.document.is_some();
                pane.build_error = Some(error);
                DispatchResult::changed()
            }
        }
    }

    fn file_op_failed(&mut self, error: FileError) -> DispatchResult {
        if error.is_cancelled() {
            return DispatchResult::unchanged();
        }
        tracing::warn!(error = %error, "file operation failed");
        self.notify(error.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
