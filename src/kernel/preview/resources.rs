//! 资源绑定的代际管理
//!
//! 每次构建领取一个递增的 generation；构建完成后，比它旧的绑定全部回收。
//! 完成得比更新一代还晚的构建会被丢弃，并回收它自己的绑定。

use crate::kernel::services::ports::BlobStore;
use std::collections::BTreeMap;

/// 一次构建发放的全部 URI（路径 -> URI）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSet {
    generation: u64,
    uris: BTreeMap<String, String>,
}

impl BindingSet {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            uris: BTreeMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bind(&mut self, blobs: &dyn BlobStore, path: &str, mime: &str, content: &str) {
        let uri = blobs.create(mime, content);
        if let Some(old) = self.uris.insert(path.to_string(), uri) {
            blobs.revoke(&old);
        }
    }

    pub fn uris(&self) -> &BTreeMap<String, String> {
        &self.uris
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    fn revoke_all(&self, blobs: &dyn BlobStore) {
        for uri in self.uris.values() {
            blobs.revoke(uri);
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    issued: u64,
    completed: u64,
    live: Option<BindingSet>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为新构建领取 generation
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn completed_generation(&self) -> u64 {
        self.completed
    }

    pub fn live(&self) -> Option<&BindingSet> {
        self.live.as_ref()
    }

    /// 安装构建结果。返回 false 表示已有更新的一代完成，本次结果作废。
    pub fn complete(&mut self, set: BindingSet, blobs: &dyn BlobStore) -> bool {
        if set.generation <= self.completed {
            tracing::debug!(
                generation = set.generation,
                completed = self.completed,
                "discarding superseded bindings"
            );
            set.revoke_all(blobs);
            return false;
        }

        if let Some(previous) = self.live.take() {
            tracing::debug!(
                generation = previous.generation,
                bindings = previous.len(),
                "revoking previous bindings"
            );
            previous.revoke_all(blobs);
        }
        self.completed = set.generation;
        self.live = Some(set);
        true
    }

    /// 会话结束时回收全部绑定
    pub fn release(&mut self, blobs: &dyn BlobStore) {
        if let Some(live) = self.live.take() {
            live.revoke_all(blobs);
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/resources.rs"]
mod tests;
