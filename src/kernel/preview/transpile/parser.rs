use super::emit::Emitter;
use super::{JsxOptions, SourceKind, TranspileError, Transpiler};
use tree_sitter::{Language, Node, Parser, Tree};

/// 基于 tree-sitter TypeScript/TSX 语法的转译器
///
/// `.ts` 使用 TypeScript 语法（允许 `<T>x` 断言），其余脚本一律按 TSX 解析，
/// 这样普通 `.js` 文件里的 JSX 也能被识别。
pub struct TreeSitterTranspiler {
    typescript: Language,
    tsx: Language,
    options: JsxOptions,
}

impl TreeSitterTranspiler {
    pub fn new(options: JsxOptions) -> Result<Self, TranspileError> {
        let typescript = tree_sitter_typescript::language_typescript();
        let tsx = tree_sitter_typescript::language_tsx();

        // 提前验证语法版本与运行时兼容
        for language in [typescript, tsx] {
            Parser::new()
                .set_language(language)
                .map_err(|e| TranspileError::Unavailable(e.to_string()))?;
        }

        Ok(Self {
            typescript,
            tsx,
            options,
        })
    }

    pub fn options(&self) -> &JsxOptions {
        &self.options
    }

    fn parse(&self, source: &str, kind: SourceKind) -> Result<Tree, TranspileError> {
        let language = match kind {
            SourceKind::TypeScript => self.typescript,
            SourceKind::JavaScript | SourceKind::Jsx | SourceKind::Tsx => self.tsx,
        };
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| TranspileError::Unavailable(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| TranspileError::Failed("parser produced no tree".to_string()))
    }
}

impl Transpiler for TreeSitterTranspiler {
    fn transpile(
        &self,
        path: &str,
        source: &str,
        kind: SourceKind,
    ) -> Result<String, TranspileError> {
        let tree = self.parse(source, kind)?;
        let root = tree.root_node();

        if root.has_error() {
            let (line, column) = first_error(root)
                .map(|node| {
                    let pos = node.start_position();
                    (pos.row + 1, pos.column + 1)
                })
                .unwrap_or((1, 1));
            return Err(TranspileError::Syntax {
                path: path.to_string(),
                message: "Unexpected token".to_string(),
                line,
                column,
            });
        }

        let mut out = String::with_capacity(source.len());
        out.push_str(&source[..root.start_byte()]);
        Emitter::new(source, &self.options).emit(root, &mut out);
        out.push_str(&source[root.end_byte()..]);
        tracing::debug!(path, bytes_in = source.len(), bytes_out = out.len(), "transpiled");
        Ok(out)
    }
}

/// 文档顺序中第一个 ERROR / MISSING 节点
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
