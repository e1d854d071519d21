//! 本地文件系统 Provider
//!
//! 实现 ProjectDirectory trait：递归读取项目目录中的文本文件，或把快照写回磁盘

use crate::kernel::services::ports::file::{FileError, ProjectDirectory, Result};
use crate::models::{extension_of, normalize_path, Snapshot};
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::Path;

const TEXT_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "scss", "less", "js", "jsx", "mjs", "cjs", "ts", "tsx", "json", "md",
    "txt", "svg", "xml", "yml", "yaml", "toml", "csv", "map",
];

const SNIFF_LEN: usize = 8192;

pub fn should_ignore(name: &str) -> bool {
    matches!(
        name,
        ".DS_Store"
            | ".Spotlight-V100"
            | ".Trashes"
            | ".fseventsd"
            | ".TemporaryItems"
            | "Thumbs.db"
            | "desktop.ini"
            | ".git"
            | ".hg"
            | ".svn"
            | "node_modules"
            | "bower_components"
    )
}

pub fn is_likely_binary(content: &[u8]) -> bool {
    let head = &content[..content.len().min(SNIFF_LEN)];
    memchr::memchr(0, head).is_some()
}

fn has_text_extension(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

fn map_io(err: io::Error, path: &Path) -> FileError {
    match err.kind() {
        io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
        _ => FileError::Io(err),
    }
}

pub struct LocalProjectProvider;

impl LocalProjectProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalProjectProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectDirectory for LocalProjectProvider {
    fn load(&self, root: &Path) -> Result<Snapshot> {
        let meta = fs::metadata(root).map_err(|e| map_io(e, root))?;
        if !meta.is_dir() {
            return Err(FileError::NotADirectory(root.to_path_buf()));
        }

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .filter_entry(|entry| !should_ignore(&entry.file_name().to_string_lossy()))
            .build();

        let mut snapshot = Snapshot::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let key = normalize_path(&relative.to_string_lossy());
            if key.is_empty() {
                continue;
            }

            let bytes = fs::read(entry.path()).map_err(|e| map_io(e, entry.path()))?;
            if !has_text_extension(&key) && is_likely_binary(&bytes) {
                tracing::debug!(path = %key, "Skipping binary file");
                continue;
            }
            match String::from_utf8(bytes) {
                Ok(text) => {
                    snapshot.insert(key, text);
                }
                Err(_) => tracing::debug!(path = %key, "Skipping non UTF-8 file"),
            }
        }

        tracing::info!(root = %root.display(), files = snapshot.len(), "Project directory loaded");
        Ok(snapshot)
    }

    fn save(&self, root: &Path, snapshot: &Snapshot) -> Result<usize> {
        if root.exists() && !root.is_dir() {
            return Err(FileError::NotADirectory(root.to_path_buf()));
        }

        let mut written = 0usize;
        for (path, content) in snapshot {
            let relative = normalize_path(path);
            if relative.is_empty() || relative.split('/').any(|seg| seg == "..") {
                tracing::warn!(path = %path, "Refusing to write path outside project root");
                continue;
            }
            let target = root.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| map_io(e, parent))?;
            }
            fs::write(&target, content).map_err(|e| map_io(e, &target))?;
            written += 1;
        }

        tracing::info!(root = %root.display(), files = written, "Project saved to directory");
        Ok(written)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
