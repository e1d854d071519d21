use super::message::AppMessage;
use crate::kernel::preview::Pipeline;
use crate::kernel::services::ports::{
    AsyncExecutor, BoxFuture, EditRequest, FileError, KeyValueStore, ProjectDirectory,
    ProjectGenerator, SavedSession,
};
use crate::models::Snapshot;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;

pub struct PreviewRuntime {
    runtime: tokio::runtime::Runtime,
    tx: Sender<AppMessage>,
}

impl PreviewRuntime {
    pub fn new(tx: Sender<AppMessage>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Ok(Self { runtime, tx })
    }

    /// 在调用线程上领取 generation，构建本身在运行时中完成；返回领取的 generation
    pub fn spawn_build(&self, pipeline: &Pipeline, snapshot: Snapshot) -> u64 {
        let generation = pipeline.begin();
        let pipeline = pipeline.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = pipeline.run(generation, &snapshot).await;
            let _ = tx.send(AppMessage::BuildFinished { generation, result });
        });
        generation
    }

    pub fn spawn_persist(
        &self,
        storage: Arc<dyn KeyValueStore>,
        key: String,
        session: SavedSession,
    ) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let key_for_save = key.clone();
            let result = tokio::task::spawn_blocking(move || {
                session.save(storage.as_ref(), &key_for_save)
            })
            .await;

            let message = match result {
                Ok(Ok(())) => AppMessage::Persisted { key },
                Ok(Err(e)) => AppMessage::PersistFailed {
                    key,
                    error: e.to_string(),
                },
                Err(e) => AppMessage::PersistFailed {
                    key,
                    error: e.to_string(),
                },
            };
            let _ = tx.send(message);
        });
    }

    pub fn load_dir(&self, provider: Arc<dyn ProjectDirectory>, root: PathBuf) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let root_for_load = root.clone();
            let result =
                tokio::task::spawn_blocking(move || provider.load(&root_for_load)).await;
            let message = match result {
                Ok(Ok(snapshot)) => AppMessage::ProjectLoaded { root, snapshot },
                Ok(Err(e)) => AppMessage::FileOpFailed(e),
                Err(e) => AppMessage::FileOpFailed(FileError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    e.to_string(),
                ))),
            };
            let _ = tx.send(message);
        });
    }

    pub fn save_dir(&self, provider: Arc<dyn ProjectDirectory>, root: PathBuf, snapshot: Snapshot) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let root_for_save = root.clone();
            let result =
                tokio::task::spawn_blocking(move || provider.save(&root_for_save, &snapshot))
                    .await;
            let message = match result {
                Ok(Ok(files)) => AppMessage::DirectorySaved { root, files },
                Ok(Err(e)) => AppMessage::FileOpFailed(e),
                Err(e) => AppMessage::FileOpFailed(FileError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    e.to_string(),
                ))),
            };
            let _ = tx.send(message);
        });
    }

    pub fn generate(&self, generator: Arc<dyn ProjectGenerator>, prompt: String, locale: String) {
        let tx = self.tx.clone();
        self.spawn(Box::pin(async move {
            let result = generator.generate(prompt, locale).await;
            let _ = tx.send(AppMessage::Generated(result));
        }));
    }

    pub fn edit(&self, generator: Arc<dyn ProjectGenerator>, request: EditRequest) {
        let tx = self.tx.clone();
        self.spawn(Box::pin(async move {
            let result = generator.edit(request).await;
            let _ = tx.send(AppMessage::Edited(result));
        }));
    }
}

impl AsyncExecutor for PreviewRuntime {
    fn spawn(&self, task: BoxFuture<()>) {
        self.runtime.spawn(task);
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime.rs"]
mod tests;
