//! Object store client boundary / 对象存储客户端边界
//!
//! The adapter never talks HTTP itself. Anything that can serve these calls
//! (the rust-s3 client in [`super::bucket`], a test double, a proxy) can back
//! an [`S3Adapter`](super::S3Adapter).

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::BackendError;
use super::options::RequestOptions;

/// GetObject response / 获取对象结果
#[derive(Debug, Clone, Default)]
pub struct GetObjectOutput {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// HeadObject response / 对象元信息
#[derive(Debug, Clone, Default)]
pub struct HeadObjectOutput {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One ListObjects call / 列举请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub max_keys: Option<usize>,
    pub continuation_token: Option<String>,
}

/// Listed object / 列举出的对象
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// One page of a listing / 列举结果页
#[derive(Debug, Clone, Default)]
pub struct ListObjectsPage {
    pub objects: Vec<ObjectSummary>,
    /// Set when more pages follow / 还有下一页时存在
    pub next_continuation_token: Option<String>,
}

/// Object store client capability consumed by the adapter / 对象存储客户端接口
///
/// Object-level calls receive the fully merged [`RequestOptions`]; the client
/// reads `Bucket`, `Key` and whatever other fields it understands from it.
/// Failures must carry the HTTP status in [`BackendError::status`] when the
/// service answered, since 404 classification depends on it.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Region the client is configured for / 客户端区域
    fn region(&self) -> String;

    async fn get_object(&self, options: &RequestOptions) -> Result<GetObjectOutput, BackendError>;

    async fn put_object(&self, options: &RequestOptions) -> Result<(), BackendError>;

    /// Copy `CopySource` (`bucket/path`) onto `Bucket`/`Key`
    async fn copy_object(&self, options: &RequestOptions) -> Result<(), BackendError>;

    async fn delete_object(&self, options: &RequestOptions) -> Result<(), BackendError>;

    async fn head_object(&self, options: &RequestOptions) -> Result<HeadObjectOutput, BackendError>;

    async fn does_object_exist(&self, bucket: &str, path: &str) -> Result<bool, BackendError>;

    async fn does_bucket_exist(&self, bucket: &str) -> Result<bool, BackendError>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError>;

    /// Fetch a single page; callers follow `next_continuation_token`
    async fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, BackendError>;
}
