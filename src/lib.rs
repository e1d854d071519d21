//! zpreview - 实时项目预览引擎
//!
//! 模块结构：
//! - models: 数据模型（虚拟项目、文件树、编辑历史、控制台）
//! - kernel: 状态/动作/副作用，构建流水线，沙箱与服务端口
//! - app: 应用层（Studio）

pub mod app;
pub mod kernel;
pub mod models;
