//! S3适配器核心实现
//!
//! 设计原则：
//! - 键通过虚拟目录映射为对象路径
//! - 请求参数 = 默认值 + 操作字段 + 元数据覆盖
//! - 存储桶只检查一次（可选自动创建）
//! - 后端错误统一翻译：404 → FileNotFound，其余 → StorageFailure

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::content_type::guess_content_type;
use crate::error::{BackendError, OperationContext, Result, StorageError};
use crate::storage::{
    Adapter, Content, Fields, ListKeysAware, MetadataSupporter, MimeTypeProvider, SizeCalculator,
};

use super::client::{HeadObjectOutput, ListObjectsRequest, ObjectStoreClient};
use super::config::S3AdapterConfig;
use super::options::{RequestOptions, CONTENT_TYPE, COPY_SOURCE};
use super::path::PathTranslator;

/// S3适配器 / Key-addressed storage over an object store bucket
pub struct S3Adapter {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    config: S3AdapterConfig,
    paths: PathTranslator,
    /// Per-key request fields merged over every request for that key
    metadata: RwLock<HashMap<String, Fields>>,
    /// true once the bucket is known to exist
    bucket_confirmed: Mutex<bool>,
}

impl S3Adapter {
    /// The client is shared with the caller and never closed here.
    pub fn new(
        client: Arc<dyn ObjectStoreClient>,
        bucket: impl Into<String>,
        mut config: S3AdapterConfig,
    ) -> Self {
        let paths = PathTranslator::new(&config.directory);
        config.directory = paths.directory().to_string();
        Self {
            client,
            bucket: bucket.into(),
            config,
            paths,
            metadata: RwLock::new(HashMap::new()),
            bucket_confirmed: Mutex::new(false),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn config(&self) -> &S3AdapterConfig {
        &self.config
    }

    /// Virtual directory, without trailing slash / 虚拟目录
    pub fn directory(&self) -> &str {
        self.paths.directory()
    }

    pub fn compute_path(&self, key: &str) -> String {
        self.paths.compute_path(key)
    }

    pub fn compute_key(&self, path: &str) -> String {
        self.paths.compute_key(path)
    }

    /// Build the request descriptor for `key` / 构建请求参数
    pub fn get_options(&self, key: &str, extra: Fields) -> RequestOptions {
        RequestOptions::merge(
            &self.config.acl,
            &self.bucket,
            self.compute_path(key),
            extra,
            self.get_metadata(key),
        )
    }

    /// Make sure the bucket exists, creating it when configured to / 确保存储桶存在
    ///
    /// Only the first successful call reaches the backend. Errors from the
    /// existence check or the creation are returned as [`StorageError::Backend`].
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        let mut confirmed = self.bucket_confirmed.lock().await;
        if *confirmed {
            return Ok(());
        }

        if self.client.does_bucket_exist(&self.bucket).await? {
            *confirmed = true;
            return Ok(());
        }

        if !self.config.create {
            return Err(StorageError::Configuration {
                message: format!(
                    "The configured bucket \"{}\" does not exist.",
                    self.bucket
                ),
            });
        }

        let region = self.client.region();
        tracing::info!("Creating S3 bucket: bucket={}, region={}", self.bucket, region);
        self.client.create_bucket(&self.bucket, &region).await?;
        *confirmed = true;
        Ok(())
    }

    async fn head(&self, operation: &'static str, key: &str) -> Result<HeadObjectOutput> {
        let options = self.get_options(key, Fields::new());
        self.client
            .head_object(&options)
            .await
            .map_err(|e| StorageError::translate(operation, key, OperationContext::key(key), e))
    }

    fn remember_content_type(&self, key: &str, content_type: String) {
        let mut metadata = self.metadata.write();
        metadata
            .entry(key.to_string())
            .or_default()
            .insert(CONTENT_TYPE.to_string(), Value::String(content_type));
    }
}

fn write_context(key: &str, content: &Content) -> OperationContext {
    let context = OperationContext::key(key);
    match content {
        Content::Bytes(data) => context.with_content(data.clone()),
        Content::File(path) => context.with_path(path),
    }
}

fn missing_field(operation: &'static str, key: &str, field: &str) -> StorageError {
    StorageError::failure(
        operation,
        OperationContext::key(key),
        BackendError::msg(format!("response has no {}", field)),
    )
}

#[async_trait]
impl Adapter for S3Adapter {
    async fn read(&self, key: &str) -> Result<Bytes> {
        self.ensure_bucket_exists().await?;
        let options = self.get_options(key, Fields::new());
        tracing::debug!("S3 read: key={}, path={:?}", key, options.key());

        let output = self
            .client
            .get_object(&options)
            .await
            .map_err(|e| StorageError::translate("read", key, OperationContext::key(key), e))?;

        if let Some(content_type) = output.content_type {
            self.remember_content_type(key, content_type);
        }
        Ok(output.body)
    }

    async fn write(&self, key: &str, content: Content) -> Result<()> {
        self.ensure_bucket_exists().await?;
        let mut options = self.get_options(key, Fields::new());

        if self.config.detect_content_type && !options.has(CONTENT_TYPE) {
            let content_type = guess_content_type(&content).await;
            tracing::debug!("S3 write: detected content type {} for {}", content_type, key);
            options.set(CONTENT_TYPE, content_type);
        }

        let context = write_context(key, &content);
        let options = options.with_body(content);
        tracing::debug!("S3 write: key={}, path={:?}", key, options.key());

        self.client
            .put_object(&options)
            .await
            .map_err(|e| StorageError::failure("write", context, e))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.compute_path(key);
        self.client
            .does_object_exist(&self.bucket, &path)
            .await
            .map_err(|e| StorageError::failure("exists", OperationContext::key(key), e))
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.list_keys("").await
    }

    async fn mtime(&self, key: &str) -> Result<DateTime<Utc>> {
        let head = self.head("mtime", key).await?;
        head.last_modified
            .ok_or_else(|| missing_field("mtime", key, "Last-Modified"))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let options = self.get_options(key, Fields::new());
        tracing::debug!("S3 delete: key={}, path={:?}", key, options.key());
        self.client
            .delete_object(&options)
            .await
            .map_err(|e| StorageError::translate("delete", key, OperationContext::key(key), e))
    }

    async fn rename(&self, source_key: &str, target_key: &str) -> Result<()> {
        self.ensure_bucket_exists().await?;

        let mut extra = Fields::new();
        extra.insert(
            COPY_SOURCE.to_string(),
            Value::String(format!("{}/{}", self.bucket, self.compute_path(source_key))),
        );
        let options = self.get_options(target_key, extra);
        tracing::debug!(
            "S3 rename: source={}, target={}, copy_source={:?}",
            source_key,
            target_key,
            options.copy_source()
        );

        self.client.copy_object(&options).await.map_err(|e| {
            StorageError::translate(
                "rename",
                source_key,
                OperationContext::key(source_key).with_target_key(target_key),
                e,
            )
        })?;

        self.delete(source_key).await
    }

    async fn is_directory(&self, key: &str) -> Result<bool> {
        let prefix = format!("{}/", self.compute_path(key).trim_end_matches('/'));
        let request = ListObjectsRequest {
            bucket: self.bucket.clone(),
            prefix: Some(prefix),
            max_keys: Some(1),
            continuation_token: None,
        };
        let page = self
            .client
            .list_objects(&request)
            .await
            .map_err(|e| StorageError::failure("isDirectory", OperationContext::key(key), e))?;
        Ok(!page.objects.is_empty())
    }
}

impl MetadataSupporter for S3Adapter {
    fn set_metadata(&self, key: &str, fields: Fields) {
        self.metadata.write().insert(key.to_string(), fields);
    }

    fn get_metadata(&self, key: &str) -> Fields {
        self.metadata.read().get(key).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ListKeysAware for S3Adapter {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.ensure_bucket_exists().await?;

        let list_prefix = if !prefix.is_empty() {
            Some(self.compute_path(prefix))
        } else if !self.directory().is_empty() {
            Some(self.directory().to_string())
        } else {
            None
        };
        let mut request = ListObjectsRequest {
            bucket: self.bucket.clone(),
            prefix: list_prefix,
            max_keys: None,
            continuation_token: None,
        };

        let mut keys = Vec::new();
        loop {
            let page = self
                .client
                .list_objects(&request)
                .await
                .map_err(|e| StorageError::failure("listKeys", OperationContext::prefix(prefix), e))?;
            keys.extend(page.objects.iter().map(|object| self.compute_key(&object.key)));
            match page.next_continuation_token {
                Some(token) => request.continuation_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("S3 list_keys: prefix={}, count={}", prefix, keys.len());
        Ok(keys)
    }
}

#[async_trait]
impl SizeCalculator for S3Adapter {
    async fn size(&self, key: &str) -> Result<u64> {
        let head = self.head("size", key).await?;
        head.content_length
            .ok_or_else(|| missing_field("size", key, "Content-Length"))
    }
}

#[async_trait]
impl MimeTypeProvider for S3Adapter {
    async fn mime_type(&self, key: &str) -> Result<Option<String>> {
        Ok(self.head("mimeType", key).await?.content_type)
    }
}
