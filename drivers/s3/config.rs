//! S3适配器配置 / S3 adapter configuration

use serde::{Deserialize, Serialize};

/// Adapter behaviour / 适配器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3AdapterConfig {
    /// 存储桶不存在时自动创建
    #[serde(default)]
    pub create: bool,
    /// 虚拟目录前缀（末尾斜杠会被去掉）
    #[serde(default)]
    pub directory: String,
    /// 写入/复制时使用的ACL
    #[serde(default = "default_acl")]
    pub acl: String,
    /// 写入时按内容探测Content-Type
    #[serde(default)]
    pub detect_content_type: bool,
}

fn default_acl() -> String {
    "private".to_string()
}

impl Default for S3AdapterConfig {
    fn default() -> Self {
        Self {
            create: false,
            directory: String::new(),
            acl: default_acl(),
            detect_content_type: false,
        }
    }
}

/// rust-s3 客户端配置 / Client connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3ClientConfig {
    /// S3端点地址
    /// AWS: https://s3.{region}.amazonaws.com
    /// MinIO: http://localhost:9000
    /// 为空时按区域拼接AWS端点
    #[serde(default)]
    pub endpoint: String,
    /// 区域
    #[serde(default = "default_region")]
    pub region: String,
    /// Access Key ID
    #[serde(default)]
    pub access_key_id: String,
    /// Secret Access Key
    #[serde(default)]
    pub secret_access_key: String,
    /// Session Token（用于临时凭证）
    #[serde(default)]
    pub session_token: String,
    /// 强制使用路径风格（MinIO等需要设置为true）
    #[serde(default)]
    pub force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for S3ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: String::new(),
            force_path_style: false,
        }
    }
}

impl S3ClientConfig {
    /// Endpoint actually used for requests / 实际使用的端点
    pub fn resolved_endpoint(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", self.region)
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        }
    }
}
