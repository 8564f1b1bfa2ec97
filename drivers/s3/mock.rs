//! In-memory recording client for tests

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::error::BackendError;
use crate::storage::Content;

use super::client::{
    GetObjectOutput, HeadObjectOutput, ListObjectsPage, ListObjectsRequest, ObjectStoreClient,
    ObjectSummary,
};
use super::options::RequestOptions;

#[derive(Clone)]
struct StoredObject {
    body: Bytes,
    content_type: Option<String>,
}

#[derive(Default)]
pub struct MockClient {
    buckets: Mutex<HashSet<String>>,
    /// (bucket, path) -> object
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, Option<u16>>>,
    created: Mutex<Vec<(String, String)>>,
    puts: Mutex<Vec<RequestOptions>>,
    copies: Mutex<Vec<RequestOptions>>,
    lists: Mutex<Vec<ListObjectsRequest>>,
    page_size: Option<usize>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(bucket: &str) -> Self {
        let client = Self::new();
        client.buckets.lock().insert(bucket.to_string());
        client
    }

    /// Cap every listing page at `size` objects
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn last_modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    /// Make every later `call` fail with `status` (None = network style error)
    pub fn fail(&self, call: &'static str, status: Option<u16>) {
        self.failures.lock().insert(call, status);
    }

    pub fn put_raw(&self, bucket: &str, path: &str, body: &[u8], content_type: Option<&str>) {
        self.objects.lock().insert(
            (bucket.to_string(), path.to_string()),
            StoredObject {
                body: Bytes::copy_from_slice(body),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    pub fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == &call).count()
    }

    pub fn created_buckets(&self) -> Vec<(String, String)> {
        self.created.lock().clone()
    }

    pub fn put_requests(&self) -> Vec<RequestOptions> {
        self.puts.lock().clone()
    }

    pub fn copy_requests(&self) -> Vec<RequestOptions> {
        self.copies.lock().clone()
    }

    pub fn list_requests(&self) -> Vec<ListObjectsRequest> {
        self.lists.lock().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), BackendError> {
        self.calls.lock().push(call);
        match self.failures.lock().get(call) {
            Some(Some(status)) => Err(BackendError::status(*status, format!("{} failed", call))),
            Some(None) => Err(BackendError::msg(format!("{}: connection reset", call))),
            None => Ok(()),
        }
    }

    fn location(options: &RequestOptions) -> (String, String) {
        (
            options.bucket().unwrap_or_default().to_string(),
            options.key().unwrap_or_default().to_string(),
        )
    }

    fn find(&self, location: &(String, String)) -> Result<StoredObject, BackendError> {
        self.objects
            .lock()
            .get(location)
            .cloned()
            .ok_or_else(|| BackendError::status(404, "NoSuchKey"))
    }
}

#[async_trait]
impl ObjectStoreClient for MockClient {
    fn region(&self) -> String {
        "eu-west-1".to_string()
    }

    async fn get_object(&self, options: &RequestOptions) -> Result<GetObjectOutput, BackendError> {
        self.record("get_object")?;
        let object = self.find(&Self::location(options))?;
        Ok(GetObjectOutput {
            body: object.body,
            content_type: object.content_type,
        })
    }

    async fn put_object(&self, options: &RequestOptions) -> Result<(), BackendError> {
        self.record("put_object")?;
        self.puts.lock().push(options.clone());
        let body = match &options.body {
            Some(Content::Bytes(data)) => data.clone(),
            Some(Content::File(path)) => Bytes::from(
                std::fs::read(path).map_err(|e| BackendError::other("read body", e))?,
            ),
            None => Bytes::new(),
        };
        self.objects.lock().insert(
            Self::location(options),
            StoredObject {
                body,
                content_type: options.content_type().map(str::to_string),
            },
        );
        Ok(())
    }

    async fn copy_object(&self, options: &RequestOptions) -> Result<(), BackendError> {
        self.record("copy_object")?;
        self.copies.lock().push(options.clone());
        let (bucket, path) = options
            .copy_source()
            .and_then(|source| source.split_once('/'))
            .ok_or_else(|| BackendError::status(400, "InvalidArgument"))?;
        let mut object = self.find(&(bucket.to_string(), path.to_string()))?;
        if let Some(content_type) = options.content_type() {
            object.content_type = Some(content_type.to_string());
        }
        self.objects.lock().insert(Self::location(options), object);
        Ok(())
    }

    async fn delete_object(&self, options: &RequestOptions) -> Result<(), BackendError> {
        self.record("delete_object")?;
        self.objects
            .lock()
            .remove(&Self::location(options))
            .map(|_| ())
            .ok_or_else(|| BackendError::status(404, "NoSuchKey"))
    }

    async fn head_object(&self, options: &RequestOptions) -> Result<HeadObjectOutput, BackendError> {
        self.record("head_object")?;
        let object = self.find(&Self::location(options))?;
        Ok(HeadObjectOutput {
            content_length: Some(object.body.len() as u64),
            content_type: object.content_type,
            last_modified: Some(Self::last_modified()),
        })
    }

    async fn does_object_exist(&self, bucket: &str, path: &str) -> Result<bool, BackendError> {
        self.record("does_object_exist")?;
        Ok(self.has_object(bucket, path))
    }

    async fn does_bucket_exist(&self, bucket: &str) -> Result<bool, BackendError> {
        self.record("does_bucket_exist")?;
        Ok(self.buckets.lock().contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError> {
        self.record("create_bucket")?;
        self.buckets.lock().insert(bucket.to_string());
        self.created
            .lock()
            .push((bucket.to_string(), region.to_string()));
        Ok(())
    }

    async fn list_objects(&self, request: &ListObjectsRequest) -> Result<ListObjectsPage, BackendError> {
        self.record("list_objects")?;
        self.lists.lock().push(request.clone());

        let prefix = request.prefix.clone().unwrap_or_default();
        let matching: Vec<ObjectSummary> = self
            .objects
            .lock()
            .iter()
            .filter(|((bucket, path), _)| *bucket == request.bucket && path.starts_with(&prefix))
            .map(|((_, path), object)| ObjectSummary {
                key: path.clone(),
                size: object.body.len() as u64,
            })
            .collect();

        let start: usize = request
            .continuation_token
            .as_deref()
            .and_then(|token| token.parse().ok())
            .unwrap_or(0);
        let limit = match (request.max_keys, self.page_size) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => usize::MAX,
        };
        let end = start.saturating_add(limit).min(matching.len());
        let next_continuation_token = if end < matching.len() && request.max_keys.is_none() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(ListObjectsPage {
            objects: matching[start.min(end)..end].to_vec(),
            next_continuation_token,
        })
    }
}
