//! Durable key-value storage contract (session auto-save).

use crate::models::Snapshot;
use serde::{Deserialize, Serialize};
use std::io;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Corrupt(String),
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage IO error: {}", e),
            StorageError::Corrupt(msg) => write!(f, "stored data is corrupt: {}", msg),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

pub const SAVED_SESSION_VERSION: u32 = 1;

/// 自动保存的会话内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub version: u32,
    pub files: Snapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_file: Option<String>,
}

impl SavedSession {
    pub fn new(files: Snapshot, active_file: Option<String>) -> Self {
        Self {
            version: SAVED_SESSION_VERSION,
            files,
            active_file,
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        let text = serde_json::to_string(self)?;
        store.set(key, &text)
    }

    /// 读取上次保存的会话；版本不符时视为不存在
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Result<Option<Self>> {
        let Some(text) = store.get(key)? else {
            return Ok(None);
        };
        let session: SavedSession = serde_json::from_str(&text)?;
        if session.version != SAVED_SESSION_VERSION {
            return Ok(None);
        }
        Ok(Some(session))
    }
}
