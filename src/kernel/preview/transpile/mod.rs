//! 脚本转译：去掉 TypeScript 类型、把 JSX 降级为工厂函数调用
//!
//! 转译器在会话内首次构建时惰性加载一次，之后一直复用（`TranspilerService`）。

mod emit;
mod jsx;
mod parser;

pub use parser::TreeSitterTranspiler;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(SourceKind::JavaScript),
            "jsx" => Some(SourceKind::Jsx),
            "ts" | "mts" | "cts" => Some(SourceKind::TypeScript),
            "tsx" => Some(SourceKind::Tsx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxOptions {
    pub factory: String,
    pub fragment: String,
}

impl Default for JsxOptions {
    fn default() -> Self {
        Self {
            factory: "React.createElement".to_string(),
            fragment: "React.Fragment".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranspileError {
    /// 语法错误；行列号从 1 开始
    Syntax {
        path: String,
        message: String,
        line: usize,
        column: usize,
    },
    Failed(String),
    Unavailable(String),
}

impl std::fmt::Display for TranspileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranspileError::Syntax {
                path,
                message,
                line,
                column,
            } => write!(f, "{}: {} ({}:{})", path, message, line, column),
            TranspileError::Failed(msg) => write!(f, "Error: {}", msg),
            TranspileError::Unavailable(msg) => write!(f, "transpiler unavailable: {}", msg),
        }
    }
}

impl std::error::Error for TranspileError {}

pub trait Transpiler: Send + Sync {
    fn transpile(
        &self,
        path: &str,
        source: &str,
        kind: SourceKind,
    ) -> Result<String, TranspileError>;
}

type TranspilerLoader =
    Box<dyn Fn() -> Result<Arc<dyn Transpiler>, TranspileError> + Send + Sync>;

/// 惰性单例：第一次 `get` 时调用 loader，结果缓存到会话结束
pub struct TranspilerService {
    cell: OnceCell<Arc<dyn Transpiler>>,
    loader: TranspilerLoader,
    loads: AtomicUsize,
}

impl TranspilerService {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Transpiler>, TranspileError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn tree_sitter(options: JsxOptions) -> Self {
        Self::new(move || {
            let transpiler = TreeSitterTranspiler::new(options.clone())?;
            Ok(Arc::new(transpiler) as Arc<dyn Transpiler>)
        })
    }

    /// 直接注入一个已构造的转译器（测试用）
    pub fn with_transpiler(transpiler: Arc<dyn Transpiler>) -> Self {
        Self::new(move || Ok(transpiler.clone()))
    }

    pub async fn get(&self) -> Result<Arc<dyn Transpiler>, TranspileError> {
        let transpiler = self
            .cell
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Loading transpiler");
                (self.loader)()
            })
            .await?;
        Ok(transpiler.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/preview/transpile/mod.rs"]
mod tests;
