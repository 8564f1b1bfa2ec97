//! 基于 rust-s3 的对象存储客户端
//!
//! rust-s3 is built without `fail-on-err`, so non-2xx answers come back as
//! normal responses. Every call checks the status code and turns failures
//! into a [`BackendError`] carrying it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::bucket_ops::BucketConfiguration;
use s3::command::Command;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::request::tokio_backend::ReqwestRequest;
use s3::request::Request;
use s3::Region;
use serde_json::Value;

use crate::error::BackendError;
use crate::storage::Content;

use super::client::{
    GetObjectOutput, HeadObjectOutput, ListObjectsPage, ListObjectsRequest, ObjectStoreClient,
    ObjectSummary,
};
use super::config::S3ClientConfig;
use super::options::{RequestOptions, CONTENT_TYPE};

const METADATA: &str = "Metadata";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Request fields sent as plain headers: (field, header)
const HEADER_FIELDS: &[(&str, &str)] = &[
    ("ACL", "x-amz-acl"),
    ("CacheControl", "cache-control"),
    ("ContentDisposition", "content-disposition"),
    ("ContentEncoding", "content-encoding"),
    ("ContentLanguage", "content-language"),
    ("Expires", "expires"),
    ("StorageClass", "x-amz-storage-class"),
    ("ServerSideEncryption", "x-amz-server-side-encryption"),
];

/// rust-s3 客户端
pub struct RustS3Client {
    config: S3ClientConfig,
    credentials: Credentials,
}

impl RustS3Client {
    pub fn new(config: S3ClientConfig) -> Result<Self, BackendError> {
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            if config.session_token.is_empty() { None } else { Some(&config.session_token) },
            None,
            None,
        )
        .map_err(|e| BackendError::other("创建S3凭证失败", e))?;

        tracing::debug!(
            "S3 client initialised: endpoint={}, region={}",
            config.resolved_endpoint(),
            config.region
        );
        Ok(Self { config, credentials })
    }

    fn s3_region(&self, region: &str) -> Region {
        Region::Custom {
            region: region.to_string(),
            endpoint: self.config.resolved_endpoint(),
        }
    }

    /// Bucket handle; building it does no I/O / 创建Bucket句柄
    fn bucket_handle(&self, name: &str) -> Result<Box<Bucket>, BackendError> {
        let bucket = Bucket::new(name, self.s3_region(&self.config.region), self.credentials.clone())
            .map_err(map_s3_error)?;
        Ok(if self.config.force_path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }

    /// Bucket handle carrying the request's headers, plus the object path
    fn request_target(&self, options: &RequestOptions) -> Result<(Box<Bucket>, String), BackendError> {
        self.request_target_with(options, request_headers(options))
    }

    fn request_target_with(
        &self,
        options: &RequestOptions,
        headers: Vec<(String, String)>,
    ) -> Result<(Box<Bucket>, String), BackendError> {
        let bucket_name = options
            .bucket()
            .ok_or_else(|| BackendError::msg("request has no Bucket"))?;
        let path = options
            .key()
            .ok_or_else(|| BackendError::msg("request has no Key"))?
            .to_string();
        let mut bucket = self.bucket_handle(bucket_name)?;
        for (name, value) in headers {
            bucket.add_header(&name, &value);
        }
        Ok((bucket, path))
    }
}

/// Headers derived from request fields / 请求字段转请求头
fn request_headers(options: &RequestOptions) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for (field, header) in HEADER_FIELDS {
        if let Some(value) = options.get_str(field).filter(|v| is_header_value(v)) {
            headers.push((header.to_string(), value.to_string()));
        }
    }
    if let Some(Value::Object(metadata)) = options.fields.get(METADATA) {
        for (name, value) in metadata {
            if !is_token(name) {
                tracing::warn!("Skipping invalid S3 metadata name: {}", name);
                continue;
            }
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if !is_header_value(&value) {
                tracing::warn!("Skipping S3 metadata {} with non-ASCII value", name);
                continue;
            }
            headers.push((format!("x-amz-meta-{}", name.to_ascii_lowercase()), value));
        }
    }
    headers
}

/// CopyObject keeps the source's metadata unless told to replace it. When the
/// request carries a content type or user metadata, send both along with the
/// REPLACE directive.
fn copy_headers(options: &RequestOptions) -> Vec<(String, String)> {
    let mut headers = request_headers(options);
    if !options.has(CONTENT_TYPE) && !options.has(METADATA) {
        return headers;
    }
    if let Some(content_type) = options.content_type().filter(|v| is_header_value(v)) {
        headers.push(("content-type".to_string(), content_type.to_string()));
    }
    headers.push(("x-amz-metadata-directive".to_string(), "REPLACE".to_string()));
    headers
}

fn is_token(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Visible ASCII and spaces only, as HTTP header values require
fn is_header_value(value: &str) -> bool {
    value.bytes().all(|b| b == b' ' || b == b'\t' || b.is_ascii_graphic())
}

fn map_s3_error(e: S3Error) -> BackendError {
    match e {
        S3Error::HttpFailWithBody(status, body) => BackendError::status(status, body),
        other => BackendError::other("S3请求失败", other),
    }
}

fn check_status(status: u16, action: &str, body: &[u8]) -> Result<(), BackendError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let detail = String::from_utf8_lossy(body);
    Err(BackendError::status(
        status,
        format!("{} failed: HTTP {} {}", action, status, detail.trim()),
    ))
}

/// Parse an HTTP date (RFC 2822, RFC 3339 as fallback) / 解析时间
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// `bucket/path` -> `(bucket, path)` / 解析复制源
fn split_copy_source(source: &str) -> Option<(&str, &str)> {
    let source = source.trim_start_matches('/');
    source.split_once('/').filter(|(bucket, path)| !bucket.is_empty() && !path.is_empty())
}

async fn load_body(body: Option<&Content>) -> Result<Vec<u8>, BackendError> {
    match body {
        Some(Content::Bytes(data)) => Ok(data.to_vec()),
        Some(Content::File(path)) => tokio::fs::read(path)
            .await
            .map_err(|e| BackendError::other(format!("读取上传文件失败: {}", path.display()), e)),
        None => Ok(Vec::new()),
    }
}

/// Resend a listing whose body did not parse and report its HTTP status
async fn list_failure(
    bucket: &Bucket,
    request: &ListObjectsRequest,
    parse_error: S3Error,
) -> BackendError {
    let command = Command::ListObjectsV2 {
        prefix: request.prefix.clone().unwrap_or_default(),
        delimiter: None,
        continuation_token: request.continuation_token.clone(),
        start_after: None,
        max_keys: request.max_keys,
    };
    let response = match ReqwestRequest::new(bucket, "/", command).await {
        Ok(resend) => resend.response_data(false).await,
        Err(e) => Err(e),
    };
    match response {
        Ok(response) => match check_status(response.status_code(), "ListObjectsV2", response.as_slice()) {
            Err(e) => e,
            Ok(()) => BackendError::other("ListObjectsV2 returned an unreadable listing", parse_error),
        },
        Err(e) => map_s3_error(e),
    }
}

#[async_trait]
impl ObjectStoreClient for RustS3Client {
    fn region(&self) -> String {
        self.config.region.clone()
    }

    async fn get_object(&self, options: &RequestOptions) -> Result<GetObjectOutput, BackendError> {
        let (bucket, path) = self.request_target(options)?;
        let response = bucket.get_object(&path).await.map_err(map_s3_error)?;
        check_status(response.status_code(), "GetObject", response.bytes())?;

        let content_type = response.headers().get("content-type").cloned();
        Ok(GetObjectOutput {
            body: response.bytes().clone(),
            content_type,
        })
    }

    async fn put_object(&self, options: &RequestOptions) -> Result<(), BackendError> {
        let (bucket, path) = self.request_target(options)?;
        let data = load_body(options.body.as_ref()).await?;
        let content_type = options.content_type().unwrap_or(DEFAULT_CONTENT_TYPE);

        tracing::debug!("S3 PutObject: path={}, size={}, content_type={}", path, data.len(), content_type);
        let response = bucket
            .put_object_with_content_type(&path, &data, content_type)
            .await
            .map_err(map_s3_error)?;
        check_status(response.status_code(), "PutObject", response.bytes())
    }

    async fn copy_object(&self, options: &RequestOptions) -> Result<(), BackendError> {
        let (bucket, path) = self.request_target_with(options, copy_headers(options))?;
        let source = options
            .copy_source()
            .ok_or_else(|| BackendError::msg("request has no CopySource"))?;
        let (source_bucket, source_path) = split_copy_source(source)
            .ok_or_else(|| BackendError::msg(format!("invalid CopySource: {}", source)))?;
        if source_bucket != bucket.name() {
            return Err(BackendError::msg(format!(
                "cross-bucket copy is not supported: {} -> {}",
                source_bucket,
                bucket.name()
            )));
        }

        // copy_object_internal的from参数需要URL编码（中文等非ASCII字符）
        let encoded_source = urlencoding::encode(source_path).into_owned();
        tracing::debug!("S3 CopyObject: src={}, encoded={}, dst={}", source_path, encoded_source, path);

        let status = bucket
            .copy_object_internal(&encoded_source, &path)
            .await
            .map_err(map_s3_error)?;
        check_status(status, "CopyObject", &[])
    }

    async fn delete_object(&self, options: &RequestOptions) -> Result<(), BackendError> {
        let (bucket, path) = self.request_target(options)?;
        let response = bucket.delete_object(&path).await.map_err(map_s3_error)?;
        check_status(response.status_code(), "DeleteObject", response.bytes())
    }

    async fn head_object(&self, options: &RequestOptions) -> Result<HeadObjectOutput, BackendError> {
        let (bucket, path) = self.request_target(options)?;
        let (head, status) = bucket.head_object(&path).await.map_err(map_s3_error)?;
        check_status(status, "HeadObject", &[])?;

        Ok(HeadObjectOutput {
            content_length: head.content_length.and_then(|len| u64::try_from(len).ok()),
            content_type: head.content_type,
            last_modified: head.last_modified.as_deref().and_then(parse_http_date),
        })
    }

    async fn does_object_exist(&self, bucket: &str, path: &str) -> Result<bool, BackendError> {
        let bucket = self.bucket_handle(bucket)?;
        let (_, status) = bucket.head_object(path).await.map_err(map_s3_error)?;
        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            other => Err(BackendError::status(other, format!("HeadObject failed: HTTP {}", other))),
        }
    }

    /// HeadBucket: needs no ListBuckets permission / 检查存储桶
    async fn does_bucket_exist(&self, bucket: &str) -> Result<bool, BackendError> {
        let handle = self.bucket_handle(bucket)?;
        let (_, status) = handle.head_object("/").await.map_err(map_s3_error)?;
        tracing::debug!("S3 HeadBucket: bucket={}, status={}", bucket, status);
        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            other => Err(BackendError::status(other, format!("HeadBucket failed: HTTP {}", other))),
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError> {
        let s3_region = self.s3_region(region);
        let response = if self.config.force_path_style {
            Bucket::create_with_path_style(
                bucket,
                s3_region,
                self.credentials.clone(),
                BucketConfiguration::default(),
            )
            .await
        } else {
            Bucket::create(
                bucket,
                s3_region,
                self.credentials.clone(),
                BucketConfiguration::default(),
            )
            .await
        }
        .map_err(map_s3_error)?;

        check_status(response.response_code, "CreateBucket", response.response_text.as_bytes())?;
        tracing::info!("S3 bucket created: bucket={}, region={}", bucket, region);
        Ok(())
    }

    async fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, BackendError> {
        let bucket = self.bucket_handle(&request.bucket)?;
        let listed = bucket
            .list_page(
                request.prefix.clone().unwrap_or_default(),
                None,
                request.continuation_token.clone(),
                None,
                request.max_keys,
            )
            .await;
        let (result, status) = match listed {
            Ok(listed) => listed,
            // rust-s3 parses the body before looking at the status
            Err(e @ S3Error::SerdeXml(_)) => return Err(list_failure(&bucket, request, e).await),
            Err(e) => return Err(map_s3_error(e)),
        };
        check_status(status, "ListObjectsV2", &[])?;

        let objects = result
            .contents
            .into_iter()
            .map(|object| ObjectSummary {
                key: object.key,
                size: object.size,
            })
            .collect();
        let next_continuation_token = if result.is_truncated {
            result.next_continuation_token
        } else {
            None
        };
        Ok(ListObjectsPage {
            objects,
            next_continuation_token,
        })
    }
}
