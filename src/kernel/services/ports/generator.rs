//! AI 生成服务的接口契约（实现位于 crate 之外）

use super::runtime::BoxFuture;
use crate::models::{ProjectFile, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub history: Vec<ChatTurn>,
    pub prompt: String,
    pub snapshot: Snapshot,
    pub locale: String,
}

#[derive(Debug, Clone, Default)]
pub struct EditResponse {
    pub summary: String,
    pub changed_files: Vec<ProjectFile>,
}

#[derive(Debug)]
pub enum GeneratorError {
    Request(String),
    InvalidResponse(String),
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::Request(msg) => write!(f, "generation request failed: {}", msg),
            GeneratorError::InvalidResponse(msg) => {
                write!(f, "generation response is invalid: {}", msg)
            }
        }
    }
}

impl std::error::Error for GeneratorError {}

pub type Result<T> = std::result::Result<T, GeneratorError>;

pub trait ProjectGenerator: Send + Sync {
    fn generate(&self, prompt: String, locale: String) -> BoxFuture<Result<Snapshot>>;

    fn edit(&self, request: EditRequest) -> BoxFuture<Result<EditResponse>>;
}
