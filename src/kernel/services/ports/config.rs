use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 入口文件匹配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPolicy {
    /// 任何名称包含 `index.html`（不区分大小写）的路径；多个候选时取最浅的
    Loose,
    /// 只接受顶层的 `index.html`
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeybindingRule {
    pub key: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub history_debounce_ms: u64,
    pub autosave_interval_ms: u64,
    pub autosave_key: String,
    pub jsx_factory: String,
    pub jsx_fragment: String,
    pub bridge_tag: String,
    pub entry_policy: EntryPolicy,
    pub import_map: BTreeMap<String, String>,
    pub keybindings: Vec<KeybindingRule>,
}

pub const DEFAULT_HISTORY_DEBOUNCE_MS: u64 = 750;
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 3000;

pub fn default_import_map() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "react".to_string(),
            "https://esm.sh/react@18.2.0".to_string(),
        ),
        (
            "react/jsx-runtime".to_string(),
            "https://esm.sh/react@18.2.0/jsx-runtime".to_string(),
        ),
        (
            "react-dom".to_string(),
            "https://esm.sh/react-dom@18.2.0".to_string(),
        ),
        (
            "react-dom/client".to_string(),
            "https://esm.sh/react-dom@18.2.0/client".to_string(),
        ),
    ])
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            history_debounce_ms: DEFAULT_HISTORY_DEBOUNCE_MS,
            autosave_interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            autosave_key: "zpreview.session".to_string(),
            jsx_factory: "React.createElement".to_string(),
            jsx_fragment: "React.Fragment".to_string(),
            bridge_tag: "zpreview-console".to_string(),
            entry_policy: EntryPolicy::Loose,
            import_map: default_import_map(),
            keybindings: Vec::new(),
        }
    }
}

impl PreviewConfig {
    pub fn history_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.history_debounce_ms)
    }

    pub fn autosave_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.autosave_interval_ms)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/config.rs"]
mod tests;
