//! 控制台桥：沙箱文档把 console 输出以 `{tag, level, args}` 信封发回宿主
//!
//! 宿主侧是单个 FIFO 通道，按到达顺序追加，不去重也不延迟。

use crate::models::{ConsoleLevel, ConsoleRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// 注入脚本上的标记属性，沙箱执行时据此跳过桥本身
pub const BRIDGE_MARKER: &str = "data-zpreview-bridge";

const BRIDGE_TEMPLATE: &str = r#"(function () {
  var TAG = __TAG__;
  var target = window.parent && window.parent !== window ? window.parent : null;
  function serialize(value) {
    if (value instanceof Error) return value.stack || String(value);
    if (value === undefined) return "undefined";
    if (typeof value === "function" || typeof value === "symbol") return String(value);
    try { return JSON.parse(JSON.stringify(value)); } catch (e) { return String(value); }
  }
  function post(level, args) {
    if (!target) return;
    try {
      target.postMessage({ tag: TAG, level: level, args: Array.prototype.map.call(args, serialize) }, "*");
    } catch (e) {}
  }
  ["log", "warn", "error", "info", "clear"].forEach(function (level) {
    var original = console[level];
    console[level] = function () {
      if (original) original.apply(console, arguments);
      post(level, arguments);
    };
  });
  window.addEventListener("error", function (event) {
    var where = event.filename ? " (" + event.filename + ":" + event.lineno + ")" : "";
    console.error((event.message || "Uncaught error") + where);
  });
  window.addEventListener("unhandledrejection", function (event) {
    console.error("Uncaught (in promise) " + serialize(event.reason));
  });
})();"#;

/// 生成注入文档的桥脚本标签
pub fn bridge_script(tag: &str) -> String {
    let tag_literal = serde_json::to_string(tag).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "<script {}>{}</script>",
        BRIDGE_MARKER,
        BRIDGE_TEMPLATE.replace("__TAG__", &tag_literal)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub tag: String,
    pub level: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl BridgeEnvelope {
    pub fn new(tag: impl Into<String>, level: ConsoleLevel, args: Vec<Value>) -> Self {
        Self {
            tag: tag.into(),
            level: level.as_str().to_string(),
            args,
        }
    }

    /// 标签不符或级别未知时返回 None
    pub fn into_record(self, expected_tag: &str) -> Option<ConsoleRecord> {
        if self.tag != expected_tag {
            return None;
        }
        let level = ConsoleLevel::from_name(&self.level)?;
        if level == ConsoleLevel::Clear {
            return Some(ConsoleRecord::clear());
        }
        Some(ConsoleRecord::new(level, self.args))
    }
}

/// 解析 webview 收到的原始消息
pub fn parse_envelope(raw: &str, expected_tag: &str) -> Option<ConsoleRecord> {
    let envelope: BridgeEnvelope = serde_json::from_str(raw).ok()?;
    envelope.into_record(expected_tag)
}

pub fn console_channel(tag: impl Into<String>) -> (ConsoleSender, ConsoleReceiver) {
    let tag = tag.into();
    let (tx, rx) = mpsc::channel();
    (
        ConsoleSender {
            tx,
            tag: tag.clone(),
        },
        ConsoleReceiver { rx, tag },
    )
}

#[derive(Clone)]
pub struct ConsoleSender {
    tx: Sender<BridgeEnvelope>,
    tag: String,
}

impl ConsoleSender {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 发出即忘；接收端已关闭时静默丢弃
    pub fn post(&self, level: ConsoleLevel, args: Vec<Value>) {
        let _ = self.tx.send(BridgeEnvelope::new(self.tag.clone(), level, args));
    }

    pub fn post_envelope(&self, envelope: BridgeEnvelope) {
        let _ = self.tx.send(envelope);
    }

    /// 转发原始 JSON；无法解析的消息丢弃
    pub fn post_raw(&self, raw: &str) {
        match serde_json::from_str::<BridgeEnvelope>(raw) {
            Ok(envelope) => self.post_envelope(envelope),
            Err(e) => tracing::debug!(error = %e, "ignoring malformed bridge message"),
        }
    }
}

pub struct ConsoleReceiver {
    rx: Receiver<BridgeEnvelope>,
    tag: String,
}

impl ConsoleReceiver {
    pub fn try_recv(&mut self) -> Option<ConsoleRecord> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => {
                    if let Some(record) = envelope.into_record(&self.tag) {
                        return Some(record);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    pub fn drain(&mut self) -> Vec<ConsoleRecord> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/bridge.rs"]
mod tests;
