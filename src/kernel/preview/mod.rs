//! 预览引擎：转译管线、资源绑定、沙箱渲染与控制台桥

pub mod bridge;
pub mod document;
pub mod pipeline;
pub mod resources;
pub mod sandbox;
pub mod transpile;

pub use bridge::{console_channel, parse_envelope, BridgeEnvelope, ConsoleReceiver, ConsoleSender};
pub use pipeline::{
    find_entry, BuildError, BuildOutput, Pipeline, PipelineOptions, PreviewDocument,
};
pub use resources::{BindingSet, ResourceRegistry};
pub use sandbox::{host_page, DeviceMode, HeadlessSandbox, RenderReport, SandboxRenderer};
pub use transpile::{JsxOptions, SourceKind, TranspileError, Transpiler, TranspilerService};
