//! 预览工作室：持有 store，执行 effect，并把运行时消息与控制台输出送回 store
//!
//! 状态只在调用线程上修改；构建、持久化和目录读写都交给 `PreviewRuntime`。

mod bridge;
mod tick;

use crate::kernel::preview::{
    console_channel, host_page, ConsoleReceiver, ConsoleSender, HeadlessSandbox, JsxOptions,
    Pipeline, PipelineOptions, SandboxRenderer, TranspilerService,
};
use crate::kernel::services::adapters::{AppMessage, LocalProjectProvider, PreviewRuntime};
use crate::kernel::services::ports::{
    BlobStore, ChatTurn, EditRequest, KeyValueStore, PreviewConfig, ProjectDirectory,
    ProjectGenerator, SavedSession,
};
use crate::kernel::{Action as KernelAction, PreviewState, Store};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

/// 外部依赖；测试里可以换成内存实现
pub struct StudioServices {
    pub blobs: Arc<dyn BlobStore>,
    pub storage: Arc<dyn KeyValueStore>,
    pub directory: Arc<dyn ProjectDirectory>,
    pub generator: Option<Arc<dyn ProjectGenerator>>,
    /// 为空时使用 `HeadlessSandbox`
    pub sandbox: Option<Arc<dyn SandboxRenderer>>,
}

impl StudioServices {
    pub fn new(blobs: Arc<dyn BlobStore>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            blobs,
            storage,
            directory: Arc::new(LocalProjectProvider::new()),
            generator: None,
            sandbox: None,
        }
    }
}

pub struct Studio {
    store: Store,
    config: PreviewConfig,
    pipeline: Pipeline,
    runtime: PreviewRuntime,
    rx: Receiver<AppMessage>,
    sandbox: Arc<dyn SandboxRenderer>,
    console_tx: ConsoleSender,
    console_rx: ConsoleReceiver,
    storage: Arc<dyn KeyValueStore>,
    directory: Arc<dyn ProjectDirectory>,
    generator: Option<Arc<dyn ProjectGenerator>>,
    chat: Vec<ChatTurn>,
    builds_in_flight: usize,
}

impl Studio {
    pub fn new(config: PreviewConfig, services: StudioServices) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let runtime = PreviewRuntime::new(tx)?;

        let transpiler = TranspilerService::tree_sitter(JsxOptions {
            factory: config.jsx_factory.clone(),
            fragment: config.jsx_fragment.clone(),
        });
        let pipeline = Pipeline::new(
            Arc::new(transpiler),
            services.blobs.clone(),
            PipelineOptions::from_config(&config),
        );

        let sandbox = match services.sandbox {
            Some(sandbox) => sandbox,
            None => {
                let headless = HeadlessSandbox::new(services.blobs.clone()).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
                Arc::new(headless) as Arc<dyn SandboxRenderer>
            }
        };
        let (console_tx, console_rx) = console_channel(config.bridge_tag.clone());

        let mut studio = Self {
            store: Store::new(PreviewState::new(&config)),
            config,
            pipeline,
            runtime,
            rx,
            sandbox,
            console_tx,
            console_rx,
            storage: services.storage,
            directory: services.directory,
            generator: services.generator,
            chat: Vec::new(),
            builds_in_flight: 0,
        };
        studio.restore_session();
        Ok(studio)
    }

    /// 接受输入前先恢复上次自动保存的项目
    fn restore_session(&mut self) {
        match SavedSession::load(self.storage.as_ref(), &self.config.autosave_key) {
            Ok(Some(session)) => {
                self.dispatch_kernel(KernelAction::Restore(session));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable autosave"),
        }
    }

    pub fn state(&self) -> &PreviewState {
        self.store.state()
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn builds_in_flight(&self) -> usize {
        self.builds_in_flight
    }

    /// 当前文档的宿主页面（iframe 沙箱 + 设备外框）
    pub fn host_page(&self) -> Option<String> {
        let state = self.store.state();
        let document = state.preview.document.as_ref()?;
        Some(host_page(document, state.preview.device, &self.config.bridge_tag))
    }

    /// webview 收到的原始桥消息
    pub fn post_bridge_message(&self, raw: &str) {
        self.console_tx.post_raw(raw);
    }

    pub fn open_directory(&mut self, root: PathBuf) {
        tracing::info!(root = %root.display(), "opening project directory");
        self.runtime.load_dir(self.directory.clone(), root);
    }

    pub fn generate(&mut self, prompt: String, locale: String) -> bool {
        let Some(generator) = self.generator.clone() else {
            return self.dispatch_kernel(KernelAction::Notify(
                "No generator is configured".to_string(),
            ));
        };
        self.chat.clear();
        self.runtime.generate(generator, prompt, locale);
        false
    }

    pub fn request_edit(&mut self, prompt: String, locale: String) -> bool {
        let Some(generator) = self.generator.clone() else {
            return self.dispatch_kernel(KernelAction::Notify(
                "No generator is configured".to_string(),
            ));
        };
        let request = EditRequest {
            history: self.chat.clone(),
            prompt: prompt.clone(),
            snapshot: self.store.state().project.snapshot(),
            locale,
        };
        self.chat.push(ChatTurn {
            role: crate::kernel::services::ports::ChatRole::User,
            text: prompt,
        });
        self.runtime.edit(generator, request);
        false
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        self.pipeline.release();
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/app/studio.rs"]
mod tests;
