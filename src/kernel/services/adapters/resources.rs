//! BlobStore 实现
//!
//! - `MemoryBlobStore`: `blob:zpreview/<n>` 句柄，内容保存在进程内
//! - `DataUriStore`: 生成 base64 data URI，文档脱离进程后仍可加载

use crate::kernel::services::ports::resources::BlobStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const BLOB_PREFIX: &str = "blob:zpreview/";

#[derive(Default)]
pub struct MemoryBlobStore {
    next_id: AtomicU64,
    blobs: Mutex<FxHashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn create(&self, mime: &str, content: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let uri = format!("{}{}", BLOB_PREFIX, id);
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(uri.clone(), content.to_string());
        }
        tracing::trace!(uri = %uri, mime, bytes = content.len(), "blob created");
        uri
    }

    fn revoke(&self, uri: &str) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.remove(uri);
        }
    }

    fn read(&self, uri: &str) -> Option<String> {
        self.blobs.lock().ok()?.get(uri).cloned()
    }

    fn live_count(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }
}

/// data URI 本身就是内容；相同内容会得到相同 URI，因此按引用计数跟踪
#[derive(Default)]
pub struct DataUriStore {
    live: Mutex<FxHashMap<String, usize>>,
}

impl DataUriStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn encode_data_uri(mime: &str, content: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(content.as_bytes()))
}

pub fn decode_data_uri(uri: &str) -> Option<String> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return Some(payload.to_string());
    }
    let bytes = STANDARD.decode(payload).ok()?;
    String::from_utf8(bytes).ok()
}

impl BlobStore for DataUriStore {
    fn create(&self, mime: &str, content: &str) -> String {
        let uri = encode_data_uri(mime, content);
        if let Ok(mut live) = self.live.lock() {
            *live.entry(uri.clone()).or_insert(0) += 1;
        }
        uri
    }

    fn revoke(&self, uri: &str) {
        if let Ok(mut live) = self.live.lock() {
            if let Some(count) = live.get_mut(uri) {
                *count -= 1;
                if *count == 0 {
                    live.remove(uri);
                }
            }
        }
    }

    fn read(&self, uri: &str) -> Option<String> {
        if !self.live.lock().ok()?.contains_key(uri) {
            return None;
        }
        decode_data_uri(uri)
    }

    fn live_count(&self) -> usize {
        self.live
            .lock()
            .map(|l| l.values().sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/resources.rs"]
mod tests;
