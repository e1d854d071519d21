//! 编辑历史管理（按文件的线性快照栈）
//!
//! 每个文件独立维护 `{stack, pointer}`：
//! - 提交总是写在 pointer + 1 处并截断其后的内容（新编辑丢弃 redo 历史）
//! - 在边界处 Undo / Redo 为空操作
//! - 历史在首次编辑时惰性创建，只有项目重置时才清空

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    stack: Vec<String>,
    pointer: usize,
}

impl HistoryEntry {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            stack: vec![initial.into()],
            pointer: 0,
        }
    }

    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn current(&self) -> &str {
        &self.stack[self.pointer]
    }

    /// 提交一个快照；与当前指向的内容相同时不做任何事
    pub fn commit(&mut self, content: &str) -> bool {
        if self.current() == content {
            return false;
        }
        self.stack.truncate(self.pointer + 1);
        self.stack.push(content.to_string());
        self.pointer = self.stack.len() - 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.stack.len()
    }

    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.pointer -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.pointer += 1;
        Some(self.current())
    }
}

/// 所有文件的编辑历史
#[derive(Debug, Default)]
pub struct EditHistory {
    entries: FxHashMap<String, HistoryEntry>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, path: &str) -> Option<&HistoryEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// 首次编辑前用文件原内容建立历史；已存在时不变
    pub fn seed(&mut self, path: &str, baseline: &str) {
        if !self.entries.contains_key(path) {
            self.entries
                .insert(path.to_string(), HistoryEntry::new(baseline));
        }
    }

    pub fn commit(&mut self, path: &str, content: &str) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) => entry.commit(content),
            None => {
                self.entries
                    .insert(path.to_string(), HistoryEntry::new(content));
                true
            }
        }
    }

    pub fn undo(&mut self, path: &str) -> Option<String> {
        self.entries
            .get_mut(path)?
            .undo()
            .map(str::to_string)
    }

    pub fn redo(&mut self, path: &str) -> Option<String> {
        self.entries
            .get_mut(path)?
            .redo()
            .map(str::to_string)
    }

    pub fn can_undo(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(HistoryEntry::can_undo)
    }

    pub fn can_redo(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(HistoryEntry::can_redo)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/edit_history.rs"]
mod tests;
