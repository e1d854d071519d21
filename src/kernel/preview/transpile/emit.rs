//! 语法树到 JavaScript 的输出
//!
//! 默认策略是"原样复制"：节点之间的空白和注释保持不变，只有类型相关的节点被删除，
//! 少数节点（枚举、JSX、构造函数参数属性）被改写。

use super::JsxOptions;
use tree_sitter::Node;

/// 整个节点只承载类型信息，输出时直接丢弃
fn is_type_only(kind: &str) -> bool {
    matches!(
        kind,
        "type_annotation"
            | "type_parameters"
            | "type_arguments"
            | "asserts_annotation"
            | "type_predicate_annotation"
            | "interface_declaration"
            | "type_alias_declaration"
            | "ambient_declaration"
            | "function_signature"
            | "abstract_method_signature"
            | "method_signature"
            | "index_signature"
            | "implements_clause"
            | "accessibility_modifier"
            | "override_modifier"
    )
}

pub(super) struct Emitter<'a> {
    src: &'a str,
    pub(super) options: &'a JsxOptions,
}

impl<'a> Emitter<'a> {
    pub fn new(src: &'a str, options: &'a JsxOptions) -> Self {
        Self { src, options }
    }

    pub(super) fn text(&self, node: Node<'_>) -> &'a str {
        &self.src[node.start_byte()..node.end_byte()]
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }

    pub(super) fn emit_to_string(&self, node: Node<'_>) -> String {
        let mut out = String::new();
        self.emit(node, &mut out);
        out
    }

    pub fn emit(&self, node: Node<'_>, out: &mut String) {
        let kind = node.kind();
        if is_type_only(kind) {
            return;
        }

        match kind {
            "as_expression" | "satisfies_expression" | "non_null_expression" => {
                if let Some(inner) = first_named(node) {
                    self.emit(inner, out);
                }
            }
            "type_assertion" => {
                if let Some(inner) = last_named(node) {
                    self.emit(inner, out);
                }
            }
            "import_statement" if has_token(node, "type") || has_token(node, "typeof") => {}
            "import_statement" if imports_only_types(node) => {}
            "import_clause" => self.emit_import_clause(node, out),
            "named_imports" | "export_clause" => self.emit_specifier_list(node, out),
            "export_statement" => self.emit_export(node, out),
            "enum_declaration" => self.emit_enum(node, out),
            "abstract_class_declaration" => {
                self.emit_children_filtered(node, out, |c| c.kind() == "abstract")
            }
            "public_field_definition" => {
                if has_token(node, "declare") || has_token(node, "abstract") {
                    return;
                }
                self.emit_children_filtered(node, out, |c| {
                    !c.is_named() && matches!(c.kind(), "readonly" | "?" | "!")
                });
            }
            "required_parameter" | "optional_parameter" => {
                self.emit_children_filtered(node, out, |c| {
                    !c.is_named() && matches!(c.kind(), "readonly" | "?")
                });
            }
            "variable_declarator" => {
                self.emit_children_filtered(node, out, |c| !c.is_named() && c.kind() == "!")
            }
            "method_definition" => self.emit_method(node, out),
            "jsx_element" | "jsx_self_closing_element" => self.emit_jsx(node, out),
            _ if node.child_count() == 0 => out.push_str(self.text(node)),
            _ => self.emit_children_filtered(node, out, |_| false),
        }
    }

    /// 逐个输出子节点，并保留子节点之间的原始文本。
    ///
    /// 开头被删掉的子节点（如 `public`、`abstract`）后面的空白一并去掉。
    pub(super) fn emit_children_filtered<F>(&self, node: Node<'_>, out: &mut String, skip: F)
    where
        F: Fn(Node<'_>) -> bool,
    {
        let base = out.len();
        let mut pos = node.start_byte();
        let mut drop_gap = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let gap = self.slice(pos, child.start_byte());
            if !(drop_gap && gap.trim().is_empty()) {
                out.push_str(gap);
            }
            if !skip(child) {
                self.emit(child, out);
            }
            drop_gap = out.len() == base;
            pos = child.end_byte();
        }
        out.push_str(self.slice(pos, node.end_byte()));
    }

    fn emit_export(&self, node: Node<'_>, out: &mut String) {
        if has_token(node, "type") {
            return;
        }
        if let Some(declaration) = node.child_by_field_name("declaration") {
            if is_type_only(declaration.kind()) {
                return;
            }
        }
        if child_of_kind(node, "export_clause").is_some_and(all_type_specifiers) {
            return;
        }
        self.emit_children_filtered(node, out, |_| false);
    }

    /// `import React, { type FC } from 'react'` 去掉整组类型导入后只剩默认导入
    fn emit_import_clause(&self, node: Node<'_>, out: &mut String) {
        let type_group =
            child_of_kind(node, "named_imports").filter(|list| all_type_specifiers(*list));
        let Some(type_group) = type_group else {
            self.emit_children_filtered(node, out, |_| false);
            return;
        };
        let parts: Vec<String> = named_children(node)
            .into_iter()
            .filter(|c| c.id() != type_group.id() && c.kind() != "comment")
            .map(|c| self.emit_to_string(c))
            .collect();
        out.push_str(&parts.join(", "));
    }

    /// 去掉 `{ type A, b }` 中的类型说明符
    fn emit_specifier_list(&self, node: Node<'_>, out: &mut String) {
        let specifiers = specifiers(node);
        if !specifiers.iter().any(|s| is_type_specifier(*s)) {
            self.emit_children_filtered(node, out, |_| false);
            return;
        }
        let kept: Vec<String> = specifiers
            .into_iter()
            .filter(|s| !is_type_specifier(*s))
            .map(|s| self.emit_to_string(s))
            .collect();
        if kept.is_empty() {
            out.push_str("{}");
        } else {
            out.push_str("{ ");
            out.push_str(&kept.join(", "));
            out.push_str(" }");
        }
    }

    fn emit_method(&self, node: Node<'_>, out: &mut String) {
        let is_constructor = node
            .child_by_field_name("name")
            .is_some_and(|name| self.text(name) == "constructor");
        let properties = if is_constructor {
            self.parameter_properties(node)
        } else {
            Vec::new()
        };
        let body = node.child_by_field_name("body");

        let mut pos = node.start_byte();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            out.push_str(self.slice(pos, child.start_byte()));
            pos = child.end_byte();
            if !child.is_named() && child.kind() == "?" {
                continue;
            }
            if !properties.is_empty() && body.is_some_and(|b| b.id() == child.id()) {
                self.emit_constructor_body(child, &properties, out);
            } else {
                self.emit(child, out);
            }
        }
        out.push_str(self.slice(pos, node.end_byte()));
    }

    /// `constructor(private x: number)` 中带修饰符的参数名
    fn parameter_properties(&self, method: Node<'_>) -> Vec<&'a str> {
        let Some(params) = method.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut names = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            let mut inner = param.walk();
            let is_property = param.children(&mut inner).any(|c| {
                c.kind() == "accessibility_modifier" || (!c.is_named() && c.kind() == "readonly")
            });
            if !is_property {
                continue;
            }
            if let Some(pattern) = param.child_by_field_name("pattern") {
                if pattern.kind() == "identifier" {
                    names.push(self.text(pattern));
                }
            }
        }
        names
    }

    fn emit_constructor_body(&self, body: Node<'_>, properties: &[&str], out: &mut String) {
        let assignments: String = properties
            .iter()
            .map(|name| format!(" this.{} = {};", name, name))
            .collect();

        let mut cursor = body.walk();
        let children: Vec<Node<'_>> = body.children(&mut cursor).collect();
        // 派生类必须先调用 super()，赋值插在它之后
        let anchor = children
            .iter()
            .find(|c| c.is_named() && c.kind() != "comment")
            .filter(|stmt| is_super_call(**stmt))
            .or_else(|| children.first())
            .map(|n| n.id());

        let mut pos = body.start_byte();
        for child in children {
            out.push_str(self.slice(pos, child.start_byte()));
            self.emit(child, out);
            if Some(child.id()) == anchor {
                out.push_str(&assignments);
            }
            pos = child.end_byte();
        }
        out.push_str(self.slice(pos, body.end_byte()));
    }

    /// `enum E { A, B = 5 }` -> `var E; (function (E) { ... })(E || (E = {}));`
    fn emit_enum(&self, node: Node<'_>, out: &mut String) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node);
        out.push_str(&format!("var {name}; (function ({name}) {{"));

        let mut next: Option<f64> = Some(0.0);
        let mut previous: Option<String> = None;
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                let (key_node, value) = match member.kind() {
                    "comment" => continue,
                    "enum_assignment" => (
                        member.child_by_field_name("name"),
                        member.child_by_field_name("value"),
                    ),
                    _ => (Some(member), None),
                };
                let Some(key_node) = key_node else {
                    continue;
                };
                let key = enum_key(key_node.kind(), self.text(key_node));
                let key_lit = js_string(&key);

                match value {
                    Some(value) if matches!(value.kind(), "string" | "template_string") => {
                        let value = self.emit_to_string(value);
                        out.push_str(&format!(" {name}[{key_lit}] = {value};"));
                        next = None;
                    }
                    Some(value) => {
                        let value = self.emit_to_string(value);
                        next = parse_number(&value).map(|n| n + 1.0);
                        out.push_str(&format!(
                            " {name}[{name}[{key_lit}] = {value}] = {key_lit};"
                        ));
                    }
                    None => {
                        let value = match (next, previous.as_deref()) {
                            (Some(n), _) => format_number(n),
                            (None, Some(prev)) => format!("{name}[{}] + 1", js_string(prev)),
                            (None, None) => "0".to_string(),
                        };
                        next = next.map(|n| n + 1.0);
                        out.push_str(&format!(
                            " {name}[{name}[{key_lit}] = {value}] = {key_lit};"
                        ));
                    }
                }
                previous = Some(key);
            }
        }

        out.push_str(&format!(" }})({name} || ({name} = {{}}));"));
    }
}

pub(super) fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    found
}

fn last_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .last();
    found
}

/// 是否含有指定的匿名 token（如 `import type` 中的 `type`）
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

fn specifiers(list: Node<'_>) -> Vec<Node<'_>> {
    named_children(list)
        .into_iter()
        .filter(|c| matches!(c.kind(), "import_specifier" | "export_specifier"))
        .collect()
}

fn is_type_specifier(node: Node<'_>) -> bool {
    matches!(node.kind(), "import_specifier" | "export_specifier")
        && (has_token(node, "type") || has_token(node, "typeof"))
}

fn all_type_specifiers(list: Node<'_>) -> bool {
    let specifiers = specifiers(list);
    !specifiers.is_empty() && specifiers.into_iter().all(is_type_specifier)
}

/// 只有类型说明符的导入整条删除
fn imports_only_types(node: Node<'_>) -> bool {
    let Some(clause) = child_of_kind(node, "import_clause") else {
        return false;
    };
    let parts: Vec<Node<'_>> = named_children(clause)
        .into_iter()
        .filter(|c| c.kind() != "comment")
        .collect();
    parts.len() == 1 && parts[0].kind() == "named_imports" && all_type_specifiers(parts[0])
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

fn is_super_call(stmt: Node<'_>) -> bool {
    if stmt.kind() != "expression_statement" {
        return false;
    }
    first_named(stmt)
        .filter(|expr| expr.kind() == "call_expression")
        .and_then(|call| call.child_by_field_name("function"))
        .is_some_and(|callee| callee.kind() == "super")
}

fn enum_key(kind: &str, text: &str) -> String {
    if kind == "string" && text.len() >= 2 {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

pub(super) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn parse_number(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
