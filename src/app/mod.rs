//! 应用层：把 kernel、运行时和沙箱组装成可驱动的预览工作室

mod studio;

pub use studio::{Studio, StudioServices};
