//! Storage error types / 存储错误类型
//!
//! Backend clients report failures as [`BackendError`], which carries the HTTP
//! status code when the service answered. Adapters translate those into
//! [`StorageError`], the small taxonomy callers match on.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

/// Result alias for adapter operations / 适配器操作结果
pub type Result<T> = std::result::Result<T, StorageError>;

/// Structured error returned by an object store client / 对象存储客户端错误
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BackendError {
    /// HTTP status code reported by the service, if any / HTTP状态码
    pub status: Option<u16>,
    /// Human readable description / 错误描述
    pub message: String,
    /// Underlying transport or parse error / 底层错误
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// Error for a non-success HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// Error without a status code (network failures, malformed responses)
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a lower level error
    pub fn other(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            status: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the service answered 404 / 是否为404
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Input arguments of a failed operation, kept for diagnostics / 失败操作的参数
///
/// `content` is stored verbatim and may be large. File-backed content is
/// recorded by its location in `path`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationContext {
    pub key: Option<String>,
    pub target_key: Option<String>,
    pub prefix: Option<String>,
    pub content: Option<Bytes>,
    pub path: Option<PathBuf>,
}

impl OperationContext {
    pub fn key(key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Default::default()
        }
    }

    pub fn prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        }
    }

    pub fn with_target_key(mut self, target_key: &str) -> Self {
        self.target_key = Some(target_key.to_string());
        self
    }

    pub fn with_content(mut self, content: Bytes) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

impl fmt::Display for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(key) = &self.key {
            parts.push(format!("key={}", key));
        }
        if let Some(target_key) = &self.target_key {
            parts.push(format!("target_key={}", target_key));
        }
        if let Some(prefix) = &self.prefix {
            parts.push(format!("prefix={}", prefix));
        }
        if let Some(content) = &self.content {
            parts.push(format!("content=<{} bytes>", content.len()));
        }
        if let Some(path) = &self.path {
            parts.push(format!("path={}", path.display()));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Adapter error taxonomy / 适配器错误分类
#[derive(Error, Debug)]
pub enum StorageError {
    /// The addressed object does not exist / 文件不存在
    #[error("File not found: {key}")]
    FileNotFound { key: String },

    /// Any other backend failure, with the operation and its arguments
    #[error("Storage failure during {operation} ({context}): {source}")]
    StorageFailure {
        operation: &'static str,
        context: OperationContext,
        #[source]
        source: BackendError,
    },

    /// Setup mistake, e.g. the bucket is missing and auto-create is off / 配置错误
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Untranslated backend error raised while checking or creating the bucket
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Generic failure for `operation` / 通用存储失败
    pub fn failure(
        operation: &'static str,
        context: OperationContext,
        source: BackendError,
    ) -> Self {
        Self::StorageFailure {
            operation,
            context,
            source,
        }
    }

    /// 404 becomes `FileNotFound(key)`, anything else a `StorageFailure`
    pub fn translate(
        operation: &'static str,
        key: &str,
        context: OperationContext,
        source: BackendError,
    ) -> Self {
        if source.is_not_found() {
            Self::FileNotFound {
                key: key.to_string(),
            }
        } else {
            Self::failure(operation, context, source)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_not_found() {
        let err = StorageError::translate(
            "read",
            "a.txt",
            OperationContext::key("a.txt"),
            BackendError::status(404, "NoSuchKey"),
        );
        match err {
            StorageError::FileNotFound { key } => assert_eq!(key, "a.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_translate_other_status() {
        let err = StorageError::translate(
            "size",
            "a.txt",
            OperationContext::key("a.txt"),
            BackendError::status(403, "AccessDenied"),
        );
        match err {
            StorageError::StorageFailure {
                operation,
                context,
                source,
            } => {
                assert_eq!(operation, "size");
                assert_eq!(context.key.as_deref(), Some("a.txt"));
                assert_eq!(source.status, Some(403));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_network_error_is_generic() {
        let err = StorageError::translate(
            "delete",
            "a.txt",
            OperationContext::key("a.txt"),
            BackendError::msg("connection reset"),
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_context_display() {
        let ctx = OperationContext::key("old.txt")
            .with_target_key("new.txt")
            .with_content(Bytes::from_static(b"abc"));
        assert_eq!(
            ctx.to_string(),
            "key=old.txt, target_key=new.txt, content=<3 bytes>"
        );

        let ctx = OperationContext::key("big.bin").with_path(Path::new("/tmp/upload.bin"));
        assert_eq!(ctx.to_string(), "key=big.bin, path=/tmp/upload.bin");
    }
}
