//! 入口 HTML 的改写：引用替换与脚本注入

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::normalize_path;

static MARKUP_RE: OnceLock<Option<Regex>> = OnceLock::new();
static REFERENCE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static HEAD_CLOSE_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// 注释、`<script>`/`<style>`（开始标签与原始文本体分开捕获）以及其余开始标签
fn markup_re() -> Option<&'static Regex> {
    MARKUP_RE
        .get_or_init(|| {
            Regex::new(
                r"(?is)(<!--.*?-->)|(<script\b[^>]*>)(.*?</script\s*>)|(<style\b[^>]*>)(.*?</style\s*>)|(<[a-z][^>]*>)",
            )
            .ok()
        })
        .as_ref()
}

fn reference_re() -> Option<&'static Regex> {
    REFERENCE_RE
        .get_or_init(|| {
            Regex::new(r#"(?i)(\s(?:src|href)\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).ok()
        })
        .as_ref()
}

fn head_close_re() -> Option<&'static Regex> {
    HEAD_CLOSE_RE
        .get_or_init(|| Regex::new(r"(?i)</head\s*>").ok())
        .as_ref()
}

/// 不指向项目内文件的引用
pub fn is_external(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower.contains("://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
        || lower.starts_with("blob:")
        || lower.starts_with("mailto:")
        || lower.starts_with("javascript:")
        || lower.starts_with('#')
}

/// 入口文件所在目录（顶层文件为空串）
pub fn entry_dir(entry: &str) -> &str {
    entry.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// 把相对路径拼到目录上并消解 `.` / `..`；越过根目录时返回 None
pub fn join_relative(dir: &str, reference: &str) -> Option<String> {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// 查找引用对应的绑定 URI。
///
/// 先按入口目录解析相对引用，再按项目根解析（去掉开头的 `./` 或 `/`）。
pub fn resolve_reference<'b>(
    reference: &str,
    entry_dir: &str,
    bindings: &'b BTreeMap<String, String>,
) -> Option<&'b str> {
    if is_external(reference) {
        return None;
    }
    let path = reference
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or(reference)
        .trim();

    if !path.starts_with('/') && !entry_dir.is_empty() {
        if let Some(joined) = join_relative(entry_dir, path) {
            if let Some(uri) = bindings.get(&joined) {
                return Some(uri.as_str());
            }
        }
    }
    bindings.get(&normalize_path(path)).map(String::as_str)
}

/// 替换标签属性 `src=` / `href=` 中能解析到绑定资源的引用，返回改写后的文本与替换次数。
///
/// 只改写标签本身；注释以及 `<script>`/`<style>` 的内容保持原样。
pub fn rewrite_references(
    html: &str,
    entry_dir: &str,
    bindings: &BTreeMap<String, String>,
) -> (String, usize) {
    let Some(re) = markup_re() else {
        return (html.to_string(), 0);
    };

    let mut replaced = 0usize;
    let rewritten = re.replace_all(html, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            return caps[0].to_string();
        }
        let (tag, body) = if let Some(tag) = caps.get(2) {
            (tag.as_str(), caps.get(3).map(|m| m.as_str()).unwrap_or_default())
        } else if let Some(tag) = caps.get(4) {
            (tag.as_str(), caps.get(5).map(|m| m.as_str()).unwrap_or_default())
        } else {
            (caps.get(6).map(|m| m.as_str()).unwrap_or_default(), "")
        };
        let (tag, count) = rewrite_tag(tag, entry_dir, bindings);
        replaced += count;
        format!("{tag}{body}")
    });

    (rewritten.into_owned(), replaced)
}

fn rewrite_tag(
    tag: &str,
    entry_dir: &str,
    bindings: &BTreeMap<String, String>,
) -> (String, usize) {
    let Some(re) = reference_re() else {
        return (tag.to_string(), 0);
    };

    let mut replaced = 0usize;
    let rewritten = re.replace_all(tag, |caps: &Captures<'_>| {
        let prefix = &caps[1];
        let (value, quote) = if let Some(m) = caps.get(2) {
            (m.as_str(), "\"")
        } else if let Some(m) = caps.get(3) {
            (m.as_str(), "'")
        } else {
            (caps.get(4).map(|m| m.as_str()).unwrap_or_default(), "")
        };

        match resolve_reference(value, entry_dir, bindings) {
            Some(uri) => {
                replaced += 1;
                format!("{prefix}{quote}{uri}{quote}")
            }
            None => caps[0].to_string(),
        }
    });

    (rewritten.into_owned(), replaced)
}

/// 在 `</head>` 之前插入片段；没有 head 时放到文档开头
pub fn inject_head(html: &str, snippet: &str) -> String {
    if let Some(m) = head_close_re().and_then(|re| re.find(html)) {
        let mut out = String::with_capacity(html.len() + snippet.len());
        out.push_str(&html[..m.start()]);
        out.push_str(snippet);
        out.push_str(&html[m.start()..]);
        return out;
    }
    format!("{snippet}{html}")
}

/// `<script type="importmap">{"imports": {...}}</script>`，键按字典序输出
pub fn import_map_tag(imports: &BTreeMap<String, String>) -> String {
    let body = serde_json::json!({ "imports": imports });
    format!("<script type=\"importmap\">{}</script>", body)
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/document.rs"]
mod tests;
