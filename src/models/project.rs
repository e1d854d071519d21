//! 虚拟项目存储：路径 -> 文本内容的扁平映射
//!
//! 项目快照是唯一的数据源：
//! - 路径使用 `/` 分隔，区分大小写
//! - 单个文件的写入总是整体替换，不存在部分写入
//! - 每次内容变化都会递增 revision，供重建调度判断快照是否变化

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 完整项目快照（路径 -> 内容）
pub type Snapshot = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// 规范化项目内路径：统一分隔符，去掉开头的 `./` 与 `/`
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

/// 文件扩展名（小写，不含点）
pub fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[derive(Debug, Default)]
pub struct VirtualProject {
    files: Snapshot,
    revision: u64,
    external_root: Option<PathBuf>,
}

impl VirtualProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut project = Self::new();
        project.replace_all(snapshot);
        project
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn files(&self) -> &Snapshot {
        &self.files
    }

    /// 拷贝一份快照（用于构建与持久化，不与存储共享可变状态）
    pub fn snapshot(&self) -> Snapshot {
        self.files.clone()
    }

    /// 整体替换单个文件内容，返回内容是否发生变化
    pub fn write(&mut self, path: &str, content: impl Into<String>) -> bool {
        let path = normalize_path(path);
        if path.is_empty() {
            return false;
        }
        let content = content.into();
        if self.files.get(&path) == Some(&content) {
            return false;
        }
        self.files.insert(path, content);
        self.revision += 1;
        true
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        let removed = self.files.remove(path);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// 批量替换（AI 编辑），返回实际变化的路径
    pub fn apply_batch(&mut self, files: &[ProjectFile]) -> Vec<String> {
        let mut changed = Vec::new();
        for file in files {
            if self.write(&file.path, file.content.as_str()) {
                changed.push(normalize_path(&file.path));
            }
        }
        changed
    }

    /// 加载整个项目，旧内容全部丢弃
    pub fn replace_all(&mut self, snapshot: Snapshot) {
        self.files = snapshot
            .into_iter()
            .map(|(path, content)| (normalize_path(&path), content))
            .filter(|(path, _)| !path.is_empty())
            .collect();
        self.revision += 1;
    }

    pub fn reset(&mut self) {
        self.files.clear();
        self.external_root = None;
        self.revision += 1;
    }

    pub fn external_root(&self) -> Option<&Path> {
        self.external_root.as_deref()
    }

    pub fn bind_external(&mut self, root: Option<PathBuf>) {
        self.external_root = root;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/project.rs"]
mod tests;
