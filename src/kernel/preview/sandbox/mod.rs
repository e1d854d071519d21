//! 沙箱渲染：在隔离环境中执行组装好的文档，输出经控制台桥回到宿主

mod eval;
mod headless;
mod host;

pub use headless::HeadlessSandbox;
pub use host::{host_page, SANDBOX_PERMISSIONS};

use super::bridge::ConsoleSender;
use super::pipeline::PreviewDocument;
use serde::{Deserialize, Serialize};

/// 设备模拟只是固定尺寸的外框，不改变文档和桥协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceMode::Desktop => "desktop",
            DeviceMode::Tablet => "tablet",
            DeviceMode::Mobile => "mobile",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "desktop" => Some(DeviceMode::Desktop),
            "tablet" => Some(DeviceMode::Tablet),
            "mobile" | "phone" => Some(DeviceMode::Mobile),
            _ => None,
        }
    }

    /// 固定视口尺寸（宽, 高）；桌面模式铺满
    pub fn viewport(self) -> Option<(u32, u32)> {
        match self {
            DeviceMode::Desktop => None,
            DeviceMode::Tablet => Some((768, 1024)),
            DeviceMode::Mobile => Some((375, 667)),
        }
    }
}

#[derive(Debug)]
pub enum SandboxError {
    Unavailable(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::Unavailable(msg) => write!(f, "sandbox unavailable: {}", msg),
        }
    }
}

impl std::error::Error for SandboxError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub scripts_run: usize,
    pub scripts_skipped: usize,
    pub uncaught: usize,
}

pub trait SandboxRenderer: Send + Sync {
    /// 执行文档；所有控制台输出只经 `console` 发回
    fn render(
        &self,
        document: &PreviewDocument,
        console: &ConsoleSender,
    ) -> Result<RenderReport, SandboxError>;
}
