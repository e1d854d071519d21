//! JSX 降级：`<a b="c">x</a>` -> `factory("a", { b: "c" }, "x")`

use super::emit::{first_named, js_string, Emitter};
use tree_sitter::Node;

impl<'a> Emitter<'a> {
    pub(super) fn emit_jsx(&self, node: Node<'_>, out: &mut String) {
        let (open, children) = if node.kind() == "jsx_self_closing_element" {
            (Some(node), Vec::new())
        } else {
            (node.child_by_field_name("open_tag"), self.jsx_children(node))
        };

        out.push_str(&self.options.factory);
        out.push('(');
        match open {
            Some(open) => {
                out.push_str(&self.jsx_tag(open));
                out.push_str(", ");
                out.push_str(&self.jsx_props(open));
            }
            None => {
                out.push_str(&self.options.fragment);
                out.push_str(", null");
            }
        }
        for child in children {
            out.push_str(", ");
            out.push_str(&child);
        }
        out.push(')');
    }

    fn jsx_tag(&self, open: Node<'_>) -> String {
        let Some(name) = open.child_by_field_name("name") else {
            return self.options.fragment.clone();
        };
        let text = self.text(name);
        match name.kind() {
            "identifier" if is_intrinsic(text) => js_string(text),
            "jsx_namespace_name" => js_string(text),
            _ => text.to_string(),
        }
    }

    fn jsx_props(&self, open: Node<'_>) -> String {
        let name_id = open.child_by_field_name("name").map(|n| n.id());
        let mut props = Vec::new();
        let mut cursor = open.walk();
        for child in open.named_children(&mut cursor) {
            if Some(child.id()) == name_id {
                continue;
            }
            match child.kind() {
                "jsx_attribute" => props.push(self.jsx_attribute(child)),
                // `{...props}`
                "jsx_expression" => {
                    if let Some(inner) = first_named(child) {
                        props.push(self.emit_to_string(inner));
                    }
                }
                _ => {}
            }
        }

        if props.is_empty() {
            "null".to_string()
        } else {
            format!("{{ {} }}", props.join(", "))
        }
    }

    fn jsx_attribute(&self, attr: Node<'_>) -> String {
        let mut cursor = attr.walk();
        let parts: Vec<Node<'_>> = attr
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect();

        let key = parts.first().map(|n| self.text(*n)).unwrap_or_default();
        let key = if is_identifier(key) {
            key.to_string()
        } else {
            js_string(key)
        };

        let value = match parts.get(1) {
            None => "true".to_string(),
            Some(value) => match value.kind() {
                "string" => {
                    let raw = self.text(*value);
                    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                    js_string(&decode_entities(inner))
                }
                "jsx_expression" => first_named(*value)
                    .map(|inner| self.emit_to_string(inner))
                    .unwrap_or_else(|| "undefined".to_string()),
                _ => self.emit_to_string(*value),
            },
        };

        format!("{}: {}", key, value)
    }

    /// 开闭标签之间的子节点；相邻文本（含实体引用与空白间隙）合并成一段再裁剪
    fn jsx_children(&self, element: Node<'_>) -> Vec<String> {
        let open = element.child_by_field_name("open_tag");
        let close = element.child_by_field_name("close_tag");
        let start = open.map(|n| n.end_byte()).unwrap_or(element.start_byte());
        let end = close.map(|n| n.start_byte()).unwrap_or(element.end_byte());
        let skip_ids = [open.map(|n| n.id()), close.map(|n| n.id())];

        let mut items = Vec::new();
        let mut text = String::new();
        let mut pos = start;

        let mut cursor = element.walk();
        for child in element.children(&mut cursor) {
            if skip_ids.contains(&Some(child.id())) {
                continue;
            }
            if child.start_byte() < start || child.end_byte() > end {
                continue;
            }
            text.push_str(self.slice(pos, child.start_byte()));
            pos = child.end_byte();

            match child.kind() {
                "jsx_element" | "jsx_self_closing_element" => {
                    flush_text(&mut text, &mut items);
                    items.push(self.emit_to_string(child));
                }
                "jsx_expression" => {
                    flush_text(&mut text, &mut items);
                    if let Some(inner) = first_named(child) {
                        items.push(self.emit_to_string(inner));
                    }
                }
                _ => text.push_str(self.text(child)),
            }
        }
        if pos < end {
            text.push_str(self.slice(pos, end));
        }
        flush_text(&mut text, &mut items);
        items
    }
}

fn flush_text(text: &mut String, items: &mut Vec<String>) {
    let cleaned = clean_jsx_text(text);
    if !cleaned.is_empty() {
        items.push(js_string(&decode_entities(&cleaned)));
    }
    text.clear();
}

/// 小写开头或含 `-` 的标签是宿主元素，其余按组件变量引用
fn is_intrinsic(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase()) || name.contains('-')
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// JSX 文本空白规则：
/// 含换行的空白整段丢弃，行首行尾空白去掉，非空行之间以单个空格连接
pub(super) fn clean_jsx_text(value: &str) -> String {
    let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(&trimmed);
        if i != last_non_empty {
            out.push(' ');
        }
    }
    out
}

pub(super) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "middot" => '\u{b7}',
        "bull" => '\u{2022}',
        "times" => '\u{d7}',
        _ => return None,
    };
    Some(ch)
}
