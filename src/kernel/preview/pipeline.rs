//! 快照 -> 可渲染文档
//!
//! 一次构建：定位入口、转译脚本、发放资源 URI、改写入口中的引用、
//! 注入 import map 与控制台桥。任何一个文件转译失败都会中止整次构建。

use super::bridge::bridge_script;
use super::document::{entry_dir, import_map_tag, inject_head, rewrite_references};
use super::resources::{BindingSet, ResourceRegistry};
use super::transpile::{SourceKind, TranspileError, TranspilerService};
use crate::kernel::services::ports::{
    BlobStore, EntryPolicy, PreviewConfig, MIME_CSS, MIME_JAVASCRIPT,
};
use crate::models::{extension_of, Snapshot};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDocument {
    pub generation: u64,
    /// 入口文件路径
    pub entry: String,
    pub html: String,
    /// 本代发放的绑定：项目路径 -> URI
    pub bindings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
    /// 没有入口文件：空预览，不是错误
    Empty { generation: u64 },
    Document(PreviewDocument),
    /// 更新的一代已经先完成，本次结果作废
    Superseded { generation: u64 },
}

impl BuildOutput {
    pub fn generation(&self) -> u64 {
        match self {
            BuildOutput::Empty { generation } | BuildOutput::Superseded { generation } => {
                *generation
            }
            BuildOutput::Document(doc) => doc.generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    Transpile { path: String, message: String },
    TranspilerUnavailable(String),
}

impl BuildError {
    /// 面向用户的消息
    pub fn message(&self) -> &str {
        match self {
            BuildError::Transpile { message, .. } => message,
            BuildError::TranspilerUnavailable(message) => message,
        }
    }

    fn from_transpile(path: &str, error: TranspileError) -> Self {
        match error {
            TranspileError::Unavailable(msg) => BuildError::TranspilerUnavailable(msg),
            other => BuildError::Transpile {
                path: path.to_string(),
                message: sanitize_message(&other.to_string(), path),
            },
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Transpile { path, message } => write!(f, "{}: {}", path, message),
            BuildError::TranspilerUnavailable(msg) => {
                write!(f, "transpiler unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// 去掉开头的 `Error: ` 和 `<模块名>: ` 前缀
pub fn sanitize_message(raw: &str, path: &str) -> String {
    let rest = raw.trim();
    let rest = rest.strip_prefix("Error: ").unwrap_or(rest);
    let module_prefix = format!("{}: ", path);
    let rest = rest
        .strip_prefix(module_prefix.as_str())
        .or_else(|| rest.strip_prefix("unknown: "))
        .unwrap_or(rest);
    rest.to_string()
}

/// 定位入口文件
pub fn find_entry<'a, I>(paths: I, policy: EntryPolicy) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates = paths.into_iter().filter(|path| match policy {
        EntryPolicy::Loose => path.to_ascii_lowercase().contains("index.html"),
        EntryPolicy::Exact => *path == "index.html",
    });
    candidates.min_by(|a, b| {
        let rank = |p: &str| (p != "index.html", p.matches('/').count());
        rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
    })
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub entry_policy: EntryPolicy,
    pub import_map: BTreeMap<String, String>,
    pub bridge_tag: String,
}

impl PipelineOptions {
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            entry_policy: config.entry_policy,
            import_map: config.import_map.clone(),
            bridge_tag: config.bridge_tag.clone(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&PreviewConfig::default())
    }
}

enum Bound {
    Script,
    Style,
}

fn classify(path: &str) -> Option<(Bound, Option<SourceKind>)> {
    let ext = extension_of(path)?;
    if ext == "css" {
        return Some((Bound::Style, None));
    }
    // 只绑定 .js/.jsx/.ts/.tsx
    let kind = match ext.as_str() {
        "js" | "jsx" | "ts" | "tsx" => SourceKind::from_extension(&ext)?,
        _ => return None,
    };
    Some((Bound::Script, Some(kind)))
}

/// 构建管线。克隆后可以送到运行时任务里；资源登记表在克隆之间共享。
#[derive(Clone)]
pub struct Pipeline {
    transpiler: Arc<TranspilerService>,
    blobs: Arc<dyn BlobStore>,
    registry: Arc<Mutex<ResourceRegistry>>,
    options: Arc<PipelineOptions>,
}

impl Pipeline {
    pub fn new(
        transpiler: Arc<TranspilerService>,
        blobs: Arc<dyn BlobStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transpiler,
            blobs,
            registry: Arc::new(Mutex::new(ResourceRegistry::new())),
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn transpiler(&self) -> &Arc<TranspilerService> {
        &self.transpiler
    }

    /// 为下一次构建领取 generation；必须在发起构建的线程上按顺序调用
    pub fn begin(&self) -> u64 {
        match self.registry.lock() {
            Ok(mut registry) => registry.begin(),
            Err(poisoned) => poisoned.into_inner().begin(),
        }
    }

    pub fn completed_generation(&self) -> u64 {
        self.registry
            .lock()
            .map(|r| r.completed_generation())
            .unwrap_or(0)
    }

    /// 当前生效的绑定数量
    pub fn live_bindings(&self) -> usize {
        self.registry
            .lock()
            .ok()
            .and_then(|r| r.live().map(BindingSet::len))
            .unwrap_or(0)
    }

    pub async fn build(&self, snapshot: &Snapshot) -> Result<BuildOutput, BuildError> {
        let generation = self.begin();
        self.run(generation, snapshot).await
    }

    pub async fn run(
        &self,
        generation: u64,
        snapshot: &Snapshot,
    ) -> Result<BuildOutput, BuildError> {
        let Some(entry) = find_entry(snapshot.keys().map(String::as_str), self.options.entry_policy)
        else {
            tracing::debug!(generation, "no entry file, empty preview");
            let installed = self.complete(BindingSet::new(generation));
            return Ok(if installed {
                BuildOutput::Empty { generation }
            } else {
                BuildOutput::Superseded { generation }
            });
        };
        let entry = entry.to_string();

        let resources = self.compile(snapshot).await?;

        let mut set = BindingSet::new(generation);
        for (path, mime, content) in &resources {
            set.bind(self.blobs.as_ref(), path, mime, content);
        }

        let source = snapshot.get(&entry).map(String::as_str).unwrap_or_default();
        let (html, rewritten) = rewrite_references(source, entry_dir(&entry), set.uris());
        let head = format!(
            "{}{}",
            import_map_tag(&self.options.import_map),
            bridge_script(&self.options.bridge_tag)
        );
        let html = inject_head(&html, &head);

        let document = PreviewDocument {
            generation,
            entry: entry.clone(),
            html,
            bindings: set.uris().clone(),
        };
        let bindings = set.len();
        if !self.complete(set) {
            return Ok(BuildOutput::Superseded { generation });
        }
        tracing::info!(generation, entry = %entry, bindings, rewritten, "preview built");
        Ok(BuildOutput::Document(document))
    }

    /// 转译全部脚本；失败时还没有发放任何 URI
    async fn compile(
        &self,
        snapshot: &Snapshot,
    ) -> Result<Vec<(String, &'static str, String)>, BuildError> {
        let mut resources = Vec::new();
        let mut transpiler = None;

        for (path, content) in snapshot {
            let Some((bound, kind)) = classify(path) else {
                continue;
            };
            match (bound, kind) {
                (Bound::Style, _) => {
                    resources.push((path.clone(), MIME_CSS, content.clone()));
                }
                (Bound::Script, Some(kind)) => {
                    if transpiler.is_none() {
                        let loaded = self
                            .transpiler
                            .get()
                            .await
                            .map_err(|e| BuildError::from_transpile(path, e))?;
                        transpiler = Some(loaded);
                    }
                    let Some(transpiler) = transpiler.as_ref() else {
                        continue;
                    };
                    let output = transpiler.transpile(path, content, kind).map_err(|e| {
                        tracing::warn!(path = %path, error = %e, "transpile failed");
                        BuildError::from_transpile(path, e)
                    })?;
                    resources.push((path.clone(), MIME_JAVASCRIPT, output));
                }
                (Bound::Script, None) => {}
            }
        }
        Ok(resources)
    }

    fn complete(&self, set: BindingSet) -> bool {
        match self.registry.lock() {
            Ok(mut registry) => registry.complete(set, self.blobs.as_ref()),
            Err(poisoned) => poisoned.into_inner().complete(set, self.blobs.as_ref()),
        }
    }

    /// 会话结束：回收所有仍然有效的绑定
    pub fn release(&self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.release(self.blobs.as_ref());
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/pipeline.rs"]
mod tests;
