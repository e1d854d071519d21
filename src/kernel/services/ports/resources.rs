//! 短生命周期资源句柄（blob URL 语义）

/// 把一段文本包装成带 MIME 类型的资源并返回可在文档中引用的 URI。
///
/// 每次 `create` 都产生一个新的 URI；`revoke` 之后该 URI 不再可读。
pub trait BlobStore: Send + Sync {
    fn create(&self, mime: &str, content: &str) -> String;

    fn revoke(&self, uri: &str);

    fn read(&self, uri: &str) -> Option<String>;

    /// 当前仍然有效的 URI 数量
    fn live_count(&self) -> usize;
}

pub const MIME_JAVASCRIPT: &str = "application/javascript";
pub const MIME_CSS: &str = "text/css";
