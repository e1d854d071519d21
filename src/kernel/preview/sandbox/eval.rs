//! 顶层语句的常量求值
//!
//! 只重放参数可静态确定的 `console.*` 调用与 `throw`；其余语句跳过。
//! 顶层 `const/let/var` 绑定的常量值可以被后续语句引用，被改写过的绑定不再参与求值。

use crate::kernel::preview::bridge::ConsoleSender;
use crate::models::ConsoleLevel;
use rustc_hash::FxHashMap;
use serde_json::{Map, Number, Value};
use tree_sitter::{Language, Node, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ScriptOutcome {
    Completed,
    /// 未捕获异常中止了脚本
    Threw,
    SyntaxError,
}

pub(super) fn run_script(
    language: Language,
    source: &str,
    label: &str,
    console: &ConsoleSender,
) -> ScriptOutcome {
    let mut parser = Parser::new();
    if parser.set_language(language).is_err() {
        return ScriptOutcome::SyntaxError;
    }
    let Some(tree) = parser.parse(source, None) else {
        return ScriptOutcome::SyntaxError;
    };
    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        console.post(
            ConsoleLevel::Error,
            vec![Value::String(format!(
                "Uncaught SyntaxError: Unexpected token ({}:{})",
                label, line
            ))],
        );
        return ScriptOutcome::SyntaxError;
    }

    let mut run = ScriptRun {
        src: source,
        console,
        env: FxHashMap::default(),
    };
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        if let Some(message) = run.exec_statement(stmt) {
            let line = stmt.start_position().row + 1;
            console.post(
                ConsoleLevel::Error,
                vec![Value::String(format!("{} ({}:{})", message, label, line))],
            );
            return ScriptOutcome::Threw;
        }
    }
    ScriptOutcome::Completed
}

fn first_error_line(root: Node<'_>) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

struct ScriptRun<'a> {
    src: &'a str,
    console: &'a ConsoleSender,
    env: FxHashMap<String, Binding>,
}

/// 求值结果；`undefined` 只在发往控制台时才变成字符串
#[derive(Debug, Clone, PartialEq)]
enum JsValue {
    Undefined,
    Json(Value),
}

impl JsValue {
    fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Json(Value::Null))
    }

    fn is_primitive(&self) -> bool {
        !matches!(self, JsValue::Json(Value::Array(_) | Value::Object(_)))
    }

    fn into_arg(self) -> Value {
        match self {
            JsValue::Undefined => Value::String("undefined".to_string()),
            JsValue::Json(value) => value,
        }
    }

    /// 数组/对象成员；含 `undefined` 时无法用 JSON 表达
    fn into_json(self) -> Option<Value> {
        match self {
            JsValue::Undefined => None,
            JsValue::Json(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    value: JsValue,
    constant: bool,
}

impl<'a> ScriptRun<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        &self.src[node.start_byte()..node.end_byte()]
    }

    /// 返回 Some(message) 表示语句抛出了未捕获异常
    fn exec_statement(&mut self, stmt: Node<'_>) -> Option<String> {
        match stmt.kind() {
            "lexical_declaration" | "variable_declaration" => {
                let constant = stmt
                    .child(0)
                    .is_some_and(|keyword| self.text(keyword) == "const");
                let mut cursor = stmt.walk();
                let declarators: Vec<Node<'_>> = stmt
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "variable_declarator")
                    .collect();
                for declarator in declarators {
                    let value_node = declarator.child_by_field_name("value");
                    let value = match value_node {
                        Some(node) => self.eval(node),
                        None => Some(JsValue::Undefined),
                    };
                    if let Some(node) = value_node {
                        self.invalidate(node);
                    }

                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    if name.kind() != "identifier" {
                        self.forget_identifiers(name);
                        continue;
                    }
                    let name = self.text(name).to_string();
                    match value {
                        Some(value) => {
                            self.env.insert(name, Binding { value, constant });
                        }
                        None => {
                            self.env.remove(&name);
                        }
                    }
                }
                None
            }
            "expression_statement" => {
                if let Some(expr) = named(stmt).into_iter().next() {
                    self.exec_expression(expr);
                }
                self.invalidate(stmt);
                None
            }
            "throw_statement" => {
                let message = named(stmt)
                    .into_iter()
                    .next()
                    .map(|arg| self.thrown_message(arg))
                    .unwrap_or_else(|| "Uncaught undefined".to_string());
                Some(message)
            }
            _ => {
                self.invalidate(stmt);
                None
            }
        }
    }

    fn exec_expression(&mut self, expr: Node<'_>) {
        if expr.kind() != "call_expression" {
            return;
        }
        let Some(level) = expr
            .child_by_field_name("function")
            .and_then(|callee| self.console_method(callee))
        else {
            return;
        };

        if level == ConsoleLevel::Clear {
            self.console.post(ConsoleLevel::Clear, Vec::new());
            return;
        }

        let Some(arguments) = expr.child_by_field_name("arguments") else {
            return;
        };
        let mut args = Vec::new();
        for arg in named(arguments) {
            match self.eval(arg) {
                Some(value) => args.push(value.into_arg()),
                None => {
                    tracing::debug!(
                        call = self.text(expr),
                        "skipping console call with dynamic arguments"
                    );
                    return;
                }
            }
        }
        self.console.post(level, args);
    }

    /// 语句可能改写的绑定不再可信：赋值与自增的目标直接失效；
    /// 出现 console 以外的调用后只保留 const 原始值
    fn invalidate(&mut self, node: Node<'_>) {
        let mut impure = false;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match current.kind() {
                "assignment_expression" | "augmented_assignment_expression" => {
                    if let Some(target) = current.child_by_field_name("left") {
                        self.forget_identifiers(target);
                    }
                }
                "update_expression" => {
                    if let Some(target) = current.child_by_field_name("argument") {
                        self.forget_identifiers(target);
                    }
                }
                "unary_expression" => {
                    let is_delete = current
                        .child_by_field_name("operator")
                        .is_some_and(|op| self.text(op) == "delete");
                    if is_delete {
                        if let Some(target) = current.child_by_field_name("argument") {
                            self.forget_identifiers(target);
                        }
                    }
                }
                "call_expression" => {
                    let is_console = current
                        .child_by_field_name("function")
                        .and_then(|callee| self.console_method(callee))
                        .is_some();
                    impure |= !is_console;
                }
                "new_expression" => impure = true,
                _ => {}
            }
            let mut cursor = current.walk();
            stack.extend(current.named_children(&mut cursor));
        }

        if impure {
            self.env
                .retain(|_, binding| binding.constant && binding.value.is_primitive());
        }
    }

    fn forget_identifiers(&mut self, target: Node<'_>) {
        let mut stack = vec![target];
        while let Some(current) = stack.pop() {
            if matches!(
                current.kind(),
                "identifier" | "shorthand_property_identifier_pattern"
            ) {
                self.env.remove(self.text(current));
            }
            let mut cursor = current.walk();
            stack.extend(current.named_children(&mut cursor));
        }
    }

    fn console_method(&self, callee: Node<'_>) -> Option<ConsoleLevel> {
        if callee.kind() != "member_expression" {
            return None;
        }
        let object = callee.child_by_field_name("object")?;
        let property = callee.child_by_field_name("property")?;
        if object.kind() != "identifier" || self.text(object) != "console" {
            return None;
        }
        match self.text(property) {
            "log" => Some(ConsoleLevel::Log),
            "warn" => Some(ConsoleLevel::Warn),
            "error" => Some(ConsoleLevel::Error),
            "info" => Some(ConsoleLevel::Info),
            "clear" => Some(ConsoleLevel::Clear),
            _ => None,
        }
    }

    /// 浏览器 `error` 事件的 message 形式，如 `Uncaught Error: boom`
    fn thrown_message(&self, arg: Node<'_>) -> String {
        if matches!(arg.kind(), "new_expression" | "call_expression") {
            let callee = arg
                .child_by_field_name("constructor")
                .or_else(|| arg.child_by_field_name("function"));
            if let Some(callee) = callee.filter(|c| c.kind() == "identifier") {
                let name = self.text(callee);
                if name.ends_with("Error") {
                    let message = arg
                        .child_by_field_name("arguments")
                        .and_then(|args| named(args).into_iter().next())
                        .and_then(|first| self.eval(first))
                        .map(|v| js_string(&v));
                    return match message {
                        Some(message) if !message.is_empty() => {
                            format!("Uncaught {}: {}", name, message)
                        }
                        _ => format!("Uncaught {}", name),
                    };
                }
            }
        }
        match self.eval(arg) {
            Some(value) => format!("Uncaught {}", js_string(&value)),
            None => "Uncaught exception".to_string(),
        }
    }

    fn eval(&self, node: Node<'_>) -> Option<JsValue> {
        let json = |value: Value| Some(JsValue::Json(value));
        match node.kind() {
            "string" => {
                let raw = self.text(node);
                let inner = raw.get(1..raw.len().saturating_sub(1))?;
                json(Value::String(unescape_js(inner)))
            }
            "template_string" => self.eval_template(node),
            "number" => parse_js_number(self.text(node)).and_then(|n| json(number_value(n))),
            "true" => json(Value::Bool(true)),
            "false" => json(Value::Bool(false)),
            "null" => json(Value::Null),
            "undefined" => Some(JsValue::Undefined),
            "identifier" => match self.text(node) {
                "undefined" => Some(JsValue::Undefined),
                name => self.env.get(name).map(|binding| binding.value.clone()),
            },
            "parenthesized_expression" => self.eval(named(node).into_iter().next()?),
            "array" => {
                let mut items = Vec::new();
                for item in named(node) {
                    items.push(self.eval(item)?.into_json()?);
                }
                json(Value::Array(items))
            }
            "object" => self.eval_object(node),
            "unary_expression" => {
                let operator = node.child_by_field_name("operator")?;
                let value = self.eval(node.child_by_field_name("argument")?)?;
                match self.text(operator) {
                    "-" => to_number(&value).and_then(|n| number_value_checked(-n)).and_then(json),
                    "+" => to_number(&value).and_then(number_value_checked).and_then(json),
                    "!" => json(Value::Bool(!truthy(&value))),
                    _ => None,
                }
            }
            "binary_expression" => self.eval_binary(node),
            "ternary_expression" => {
                let condition = self.eval(node.child_by_field_name("condition")?)?;
                let branch = if truthy(&condition) {
                    node.child_by_field_name("consequence")?
                } else {
                    node.child_by_field_name("alternative")?
                };
                self.eval(branch)
            }
            _ => None,
        }
    }

    fn eval_template(&self, node: Node<'_>) -> Option<JsValue> {
        // 去掉两端的反引号
        let start = node.start_byte() + 1;
        let end = node.end_byte().saturating_sub(1).max(start);
        let mut out = String::new();
        let mut raw = String::new();
        let mut pos = start;

        for child in named(node) {
            if child.kind() != "template_substitution" {
                continue;
            }
            raw.push_str(&self.src[pos..child.start_byte()]);
            out.push_str(&unescape_js(&raw));
            raw.clear();

            let value = self.eval(named(child).into_iter().next()?)?;
            out.push_str(&js_string(&value));
            pos = child.end_byte();
        }
        if pos < end {
            raw.push_str(&self.src[pos..end]);
        }
        out.push_str(&unescape_js(&raw));
        Some(JsValue::Json(Value::String(out)))
    }

    fn eval_object(&self, node: Node<'_>) -> Option<JsValue> {
        let mut map = Map::new();
        for member in named(node) {
            match member.kind() {
                "pair" => {
                    let key = member.child_by_field_name("key")?;
                    let key = match key.kind() {
                        "property_identifier" | "number" => self.text(key).to_string(),
                        "string" => {
                            let raw = self.text(key);
                            unescape_js(raw.get(1..raw.len().saturating_sub(1))?)
                        }
                        _ => return None,
                    };
                    let value = self.eval(member.child_by_field_name("value")?)?;
                    map.insert(key, value.into_json()?);
                }
                "shorthand_property_identifier" => {
                    let name = self.text(member);
                    let binding = self.env.get(name)?;
                    map.insert(name.to_string(), binding.value.clone().into_json()?);
                }
                _ => return None,
            }
        }
        Some(JsValue::Json(Value::Object(map)))
    }

    fn eval_binary(&self, node: Node<'_>) -> Option<JsValue> {
        let operator = self.text(node.child_by_field_name("operator")?);
        let left = self.eval(node.child_by_field_name("left")?)?;

        match operator {
            "&&" => {
                return if truthy(&left) {
                    self.eval(node.child_by_field_name("right")?)
                } else {
                    Some(left)
                };
            }
            "||" => {
                return if truthy(&left) {
                    Some(left)
                } else {
                    self.eval(node.child_by_field_name("right")?)
                };
            }
            "??" => {
                return if left.is_nullish() {
                    self.eval(node.child_by_field_name("right")?)
                } else {
                    Some(left)
                };
            }
            _ => {}
        }

        let right = self.eval(node.child_by_field_name("right")?)?;
        let result = match operator {
            "+" => {
                let is_string = |v: &JsValue| matches!(v, JsValue::Json(Value::String(_)));
                let concat = is_string(&left)
                    || is_string(&right)
                    || !left.is_primitive()
                    || !right.is_primitive();
                if concat {
                    Value::String(format!("{}{}", js_string(&left), js_string(&right)))
                } else {
                    number_value_checked(numeric_operand(&left)? + numeric_operand(&right)?)?
                }
            }
            "-" | "*" | "/" | "%" | "**" => {
                let a = to_number(&left)?;
                let b = to_number(&right)?;
                let n = match operator {
                    "-" => a - b,
                    "*" => a * b,
                    "/" => a / b,
                    "%" => a % b,
                    _ => a.powf(b),
                };
                number_value_checked(n)?
            }
            "===" => Value::Bool(strict_eq(&left, &right)?),
            "!==" => Value::Bool(!strict_eq(&left, &right)?),
            "==" => Value::Bool(loose_eq(&left, &right)?),
            "!=" => Value::Bool(!loose_eq(&left, &right)?),
            "<" | ">" | "<=" | ">=" => {
                let ordering = match (&left, &right) {
                    (JsValue::Json(Value::String(a)), JsValue::Json(Value::String(b))) => {
                        a.cmp(b)
                    }
                    _ => to_number(&left)?.partial_cmp(&to_number(&right)?)?,
                };
                let result = match operator {
                    "<" => ordering.is_lt(),
                    ">" => ordering.is_gt(),
                    "<=" => ordering.is_le(),
                    _ => ordering.is_ge(),
                };
                Value::Bool(result)
            }
            _ => return None,
        };
        Some(JsValue::Json(result))
    }
}

fn named(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

/// NaN 与无穷大无法用 JSON 表示，返回 None 让调用方跳过
fn number_value_checked(n: f64) -> Option<Value> {
    if n.is_finite() {
        Some(number_value(n))
    } else {
        None
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn parse_js_number(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return i64::from_str_radix(bin, 2).ok().map(|n| n as f64);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(|n| n as f64);
    }
    lower.parse::<f64>().ok()
}

/// 数值加法只在两侧都不是字符串/对象时成立；`undefined` 参与运算得到 NaN，不可表示
fn numeric_operand(value: &JsValue) -> Option<f64> {
    match value {
        JsValue::Json(Value::Number(n)) => n.as_f64(),
        JsValue::Json(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        JsValue::Json(Value::Null) => Some(0.0),
        _ => None,
    }
}

fn to_number(value: &JsValue) -> Option<f64> {
    match value {
        JsValue::Json(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        other => numeric_operand(other),
    }
}

fn truthy(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined | JsValue::Json(Value::Null) => false,
        JsValue::Json(Value::Bool(b)) => *b,
        JsValue::Json(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsValue::Json(Value::String(s)) => !s.is_empty(),
        JsValue::Json(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// 对象按引用比较，字面量之间的比较结果无法静态确定
fn strict_eq(left: &JsValue, right: &JsValue) -> Option<bool> {
    if !left.is_primitive() || !right.is_primitive() {
        return None;
    }
    Some(match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Undefined, _) | (_, JsValue::Undefined) => false,
        (JsValue::Json(Value::Number(a)), JsValue::Json(Value::Number(b))) => {
            a.as_f64() == b.as_f64()
        }
        (JsValue::Json(a), JsValue::Json(b)) => a == b,
    })
}

fn loose_eq(left: &JsValue, right: &JsValue) -> Option<bool> {
    if left.is_nullish() || right.is_nullish() {
        return Some(left.is_nullish() && right.is_nullish());
    }
    if !left.is_primitive() || !right.is_primitive() {
        return None;
    }
    match (left, right) {
        (JsValue::Json(a), JsValue::Json(b))
            if std::mem::discriminant(a) == std::mem::discriminant(b) =>
        {
            strict_eq(left, right)
        }
        // 类型不同的原始值先转成数字再比较
        _ => Some(matches!(
            (to_number(left), to_number(right)),
            (Some(a), Some(b)) if a == b
        )),
    }
}

fn js_string(value: &JsValue) -> String {
    match value {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::Json(value) => to_js_string(value),
    }
}

pub(super) fn to_js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f),
            (None, Some(f)) => f.to_string(),
            (None, None) => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// JS 字符串字面量的转义序列
pub(super) fn unescape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => out.push_str(&hex),
                }
            }
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                if let Some(c) = code.and_then(char::from_u32) {
                    out.push(c);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/preview/sandbox/eval.rs"]
mod tests;
