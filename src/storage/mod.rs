use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Backend request fields keyed by their wire names (`ACL`, `ContentType`, ...)
/// 后端请求字段
pub type Fields = Map<String, Value>;

/// Content handed to [`Adapter::write`] / 写入内容
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// In-memory buffer / 内存数据
    Bytes(Bytes),
    /// Streamed content identified by its location on disk / 本地文件
    File(PathBuf),
}

impl Content {
    /// Length when known without I/O
    pub fn len_hint(&self) -> Option<u64> {
        match self {
            Content::Bytes(data) => Some(data.len() as u64),
            Content::File(_) => None,
        }
    }
}

impl From<Bytes> for Content {
    fn from(data: Bytes) -> Self {
        Content::Bytes(data)
    }
}

impl From<Vec<u8>> for Content {
    fn from(data: Vec<u8>) -> Self {
        Content::Bytes(Bytes::from(data))
    }
}

impl From<&'static str> for Content {
    fn from(data: &'static str) -> Self {
        Content::Bytes(Bytes::from_static(data.as_bytes()))
    }
}

impl From<PathBuf> for Content {
    fn from(path: PathBuf) -> Self {
        Content::File(path)
    }
}

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }
}

/// Builds adapters from JSON configuration / 适配器工厂
pub trait AdapterFactory: Send + Sync {
    type Adapter;

    /// Adapter type name / 适配器类型名称
    fn driver_type(&self) -> &'static str;

    /// Configuration items shown to users / 配置项
    fn config_items(&self) -> Vec<ConfigItem>;

    /// 创建适配器实例
    fn create_adapter(&self, config: Value) -> anyhow::Result<Self::Adapter>;
}

/// Key-addressed storage contract (primitive operations only) / 存储适配器接口
///
/// Optional capabilities live in their own traits ([`MetadataSupporter`],
/// [`ListKeysAware`], [`SizeCalculator`], [`MimeTypeProvider`]) so a
/// filesystem facade can ask for exactly what it needs.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Read the whole object / 读取文件
    async fn read(&self, key: &str) -> Result<Bytes>;

    /// Write (create or overwrite) an object / 写入文件
    async fn write(&self, key: &str, content: Content) -> Result<()>;

    /// Whether the object exists / 文件是否存在
    async fn exists(&self, key: &str) -> Result<bool>;

    /// All keys / 列出所有键
    async fn keys(&self) -> Result<Vec<String>>;

    /// Last modification time / 修改时间
    async fn mtime(&self, key: &str) -> Result<DateTime<Utc>>;

    /// Delete an object / 删除文件
    async fn delete(&self, key: &str) -> Result<()>;

    /// Rename (move) an object / 重命名文件
    async fn rename(&self, source_key: &str, target_key: &str) -> Result<()>;

    /// Whether anything is stored under `key/` / 是否为目录
    async fn is_directory(&self, key: &str) -> Result<bool>;
}

/// Per-key request metadata / 元数据支持
pub trait MetadataSupporter {
    /// Replace the metadata fields for `key`
    fn set_metadata(&self, key: &str, fields: Fields);

    /// Metadata fields for `key` (empty when none were set)
    fn get_metadata(&self, key: &str) -> Fields;
}

/// Prefix listing / 前缀列举
#[async_trait]
pub trait ListKeysAware: Send + Sync {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Object size lookup / 文件大小
#[async_trait]
pub trait SizeCalculator: Send + Sync {
    async fn size(&self, key: &str) -> Result<u64>;
}

/// Content type lookup / 内容类型
#[async_trait]
pub trait MimeTypeProvider: Send + Sync {
    async fn mime_type(&self, key: &str) -> Result<Option<String>>;
}
