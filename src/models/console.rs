//! 控制台记录缓冲区

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Warn,
    Error,
    Info,
    System,
    Clear,
}

impl ConsoleLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Info => "info",
            ConsoleLevel::System => "system",
            ConsoleLevel::Clear => "clear",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "log" => Some(ConsoleLevel::Log),
            "warn" => Some(ConsoleLevel::Warn),
            "error" => Some(ConsoleLevel::Error),
            "info" => Some(ConsoleLevel::Info),
            "system" => Some(ConsoleLevel::System),
            "clear" => Some(ConsoleLevel::Clear),
            _ => None,
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleRecord {
    pub level: ConsoleLevel,
    pub args: Vec<Value>,
}

impl ConsoleRecord {
    pub fn new(level: ConsoleLevel, args: Vec<Value>) -> Self {
        Self { level, args }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::System, vec![Value::String(message.into())])
    }

    pub fn clear() -> Self {
        Self::new(ConsoleLevel::Clear, Vec::new())
    }

    /// 以空格拼接参数，字符串不带引号（与浏览器控制台一致）
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(|arg| match arg {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 只追加的记录缓冲区；`clear` 记录会清空而不是追加
#[derive(Debug, Default)]
pub struct ConsoleBuffer {
    records: Vec<ConsoleRecord>,
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ConsoleRecord) {
        if record.level == ConsoleLevel::Clear {
            self.records.clear();
        } else {
            self.records.push(record);
        }
    }

    pub fn records(&self) -> &[ConsoleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.level == ConsoleLevel::Error)
            .count()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/console.rs"]
mod tests;
