//! S3适配器工厂

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::storage::{AdapterFactory, ConfigItem};

use super::bucket::RustS3Client;
use super::client::ObjectStoreClient;
use super::config::{S3AdapterConfig, S3ClientConfig};
use super::driver::S3Adapter;

/// Flat JSON configuration: bucket + client settings + adapter behaviour
#[derive(Debug, Clone, Deserialize)]
struct S3DriverConfig {
    #[serde(default)]
    bucket: String,
    #[serde(flatten)]
    client: S3ClientConfig,
    #[serde(flatten)]
    adapter: S3AdapterConfig,
}

fn parse_config(config: Value) -> Result<S3DriverConfig> {
    let config: S3DriverConfig =
        serde_json::from_value(config).map_err(|e| anyhow!("配置解析失败: {}", e))?;
    if config.bucket.trim().is_empty() {
        return Err(anyhow!("配置解析失败: bucket 不能为空"));
    }
    Ok(config)
}

/// S3适配器工厂
pub struct S3AdapterFactory;

impl S3AdapterFactory {
    /// Build an adapter over an existing client, ignoring the connection settings
    pub fn create_with_client(
        &self,
        client: Arc<dyn ObjectStoreClient>,
        config: Value,
    ) -> Result<S3Adapter> {
        let config = parse_config(config)?;
        Ok(S3Adapter::new(client, config.bucket, config.adapter))
    }
}

impl AdapterFactory for S3AdapterFactory {
    type Adapter = S3Adapter;

    fn driver_type(&self) -> &'static str {
        "s3"
    }

    fn config_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("bucket", "string")
                .title("存储桶名称")
                .help("S3存储桶名称")
                .required(),
            ConfigItem::new("endpoint", "string")
                .title("端点地址")
                .help("S3端点URL，为空时使用AWS区域端点（MinIO: http://localhost:9000）"),
            ConfigItem::new("region", "string")
                .title("区域")
                .help("S3区域，如 us-east-1、cn-hangzhou")
                .default("us-east-1"),
            ConfigItem::new("access_key_id", "string")
                .title("Access Key ID")
                .required(),
            ConfigItem::new("secret_access_key", "password")
                .title("Secret Access Key")
                .required(),
            ConfigItem::new("session_token", "password")
                .title("Session Token")
                .help("临时凭证的会话令牌（可选）"),
            ConfigItem::new("force_path_style", "bool")
                .title("强制路径风格")
                .help("MinIO等需要开启此选项")
                .default("false"),
            ConfigItem::new("directory", "string")
                .title("虚拟目录")
                .help("所有对象存放在该前缀下"),
            ConfigItem::new("acl", "string")
                .title("ACL")
                .help("写入和复制时使用的预设ACL")
                .default("private"),
            ConfigItem::new("create", "bool")
                .title("自动创建存储桶")
                .help("存储桶不存在时首次使用自动创建")
                .default("false"),
            ConfigItem::new("detect_content_type", "bool")
                .title("探测内容类型")
                .help("写入时根据文件内容设置Content-Type")
                .default("false"),
        ]
    }

    fn create_adapter(&self, config: Value) -> Result<S3Adapter> {
        let config = parse_config(config)?;
        tracing::debug!(
            "Creating S3 adapter: bucket={}, directory={}",
            config.bucket,
            config.adapter.directory
        );
        let client = RustS3Client::new(config.client)?;
        Ok(S3Adapter::new(Arc::new(client), config.bucket, config.adapter))
    }
}
