use super::eval::{run_script, ScriptOutcome};
use super::{RenderReport, SandboxError, SandboxRenderer};
use crate::kernel::preview::bridge::{ConsoleSender, BRIDGE_MARKER};
use crate::kernel::preview::pipeline::PreviewDocument;
use crate::kernel::services::ports::BlobStore;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tree_sitter::{Language, Parser};

static SCRIPT_RE: OnceLock<Option<Regex>> = OnceLock::new();
static ATTR_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn script_re() -> Option<&'static Regex> {
    SCRIPT_RE
        .get_or_init(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").ok())
        .as_ref()
}

fn attr_re() -> Option<&'static Regex> {
    ATTR_RE
        .get_or_init(|| {
            Regex::new(r#"(?i)([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
                .ok()
        })
        .as_ref()
}

/// 无浏览器的沙箱：按文档顺序执行脚本，只重放能静态确定的控制台输出
///
/// 脚本从 blob 存储中读取（与 iframe 通过 URI 加载相同），
/// 因此外部 URL 或未绑定的引用会被跳过。
pub struct HeadlessSandbox {
    blobs: Arc<dyn BlobStore>,
    language: Language,
}

struct ScriptTag {
    attrs: Vec<(String, String)>,
    body: String,
}

impl ScriptTag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    fn is_javascript(&self) -> bool {
        match self.attr("type").map(|t| t.trim().to_ascii_lowercase()) {
            None => true,
            Some(t) => matches!(
                t.as_str(),
                "" | "module" | "text/javascript" | "application/javascript"
            ),
        }
    }
}

impl HeadlessSandbox {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Result<Self, SandboxError> {
        let language = tree_sitter_javascript::language();
        Parser::new()
            .set_language(language)
            .map_err(|e| SandboxError::Unavailable(e.to_string()))?;
        Ok(Self { blobs, language })
    }

    fn scripts(html: &str) -> Vec<ScriptTag> {
        let (Some(script_re), Some(attr_re)) = (script_re(), attr_re()) else {
            return Vec::new();
        };
        script_re
            .captures_iter(html)
            .map(|caps| {
                let raw_attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let attrs = attr_re
                    .captures_iter(raw_attrs)
                    .map(|a| {
                        let value = a
                            .get(2)
                            .or_else(|| a.get(3))
                            .or_else(|| a.get(4))
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default();
                        (a[1].to_string(), value)
                    })
                    .collect();
                ScriptTag {
                    attrs,
                    body: caps
                        .get(2)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }

    /// (label, source)；无法加载时返回 None
    fn load_script(&self, tag: &ScriptTag, document: &PreviewDocument) -> Option<(String, String)> {
        let Some(src) = tag.attr("src") else {
            return Some((document.entry.clone(), tag.body.clone()));
        };
        let label = document
            .bindings
            .iter()
            .find(|(_, uri)| uri.as_str() == src)
            .map(|(path, _)| path.clone());
        let Some(label) = label else {
            tracing::debug!(src, "skipping script outside the project");
            return None;
        };
        match self.blobs.read(src) {
            Some(source) => Some((label, source)),
            None => {
                tracing::warn!(src, path = %label, "script binding no longer readable");
                None
            }
        }
    }
}

impl SandboxRenderer for HeadlessSandbox {
    fn render(
        &self,
        document: &PreviewDocument,
        console: &ConsoleSender,
    ) -> Result<RenderReport, SandboxError> {
        let mut report = RenderReport::default();
        for tag in Self::scripts(&document.html) {
            if tag.has_attr(BRIDGE_MARKER) || !tag.is_javascript() {
                continue;
            }
            let Some((label, source)) = self.load_script(&tag, document) else {
                report.scripts_skipped += 1;
                continue;
            };
            match run_script(self.language, &source, &label, console) {
                ScriptOutcome::Completed => {}
                ScriptOutcome::Threw | ScriptOutcome::SyntaxError => report.uncaught += 1,
            }
            report.scripts_run += 1;
        }
        tracing::debug!(
            generation = document.generation,
            run = report.scripts_run,
            skipped = report.scripts_skipped,
            uncaught = report.uncaught,
            "headless render finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/preview/sandbox/headless.rs"]
mod tests;
