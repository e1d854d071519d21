//! 配置服务：持有预览配置，支持运行时修改

use crate::kernel::services::ports::config::{EntryPolicy, PreviewConfig};

pub struct ConfigService {
    preview: PreviewConfig,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            preview: PreviewConfig::default(),
        }
    }

    pub fn with_preview_config(preview: PreviewConfig) -> Self {
        Self { preview }
    }

    /// 从设置文件加载；文件缺失或无法解析时退回默认值
    pub fn load() -> Self {
        match super::settings::load_settings() {
            Some(preview) => Self::with_preview_config(preview),
            None => Self::new(),
        }
    }

    pub fn preview(&self) -> &PreviewConfig {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewConfig {
        &mut self.preview
    }

    pub fn into_preview(self) -> PreviewConfig {
        self.preview
    }

    pub fn set_history_debounce_ms(&mut self, ms: u64) {
        self.preview.history_debounce_ms = ms;
    }

    pub fn set_autosave_interval_ms(&mut self, ms: u64) {
        self.preview.autosave_interval_ms = ms.max(1);
    }

    pub fn set_entry_policy(&mut self, policy: EntryPolicy) {
        self.preview.entry_policy = policy;
    }

    pub fn set_import(&mut self, specifier: impl Into<String>, url: impl Into<String>) {
        self.preview.import_map.insert(specifier.into(), url.into());
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/config.rs"]
mod tests;
