//! Request descriptor assembly / 请求参数合并
//!
//! Layers, later ones overwriting same-named fields of earlier ones:
//! adapter defaults (`ACL`, `Bucket`, `Key`), operation fields, per-key
//! metadata.

use serde_json::Value;

use crate::storage::{Content, Fields};

pub const ACL: &str = "ACL";
pub const BUCKET: &str = "Bucket";
pub const KEY: &str = "Key";
pub const CONTENT_TYPE: &str = "ContentType";
pub const COPY_SOURCE: &str = "CopySource";

/// Merged request descriptor sent to the client / 请求描述
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub fields: Fields,
    /// Write body; kept out of `fields` because it is binary
    pub body: Option<Content>,
}

impl RequestOptions {
    /// Merge the three layers into one descriptor
    pub fn merge(acl: &str, bucket: &str, path: String, extra: Fields, metadata: Fields) -> Self {
        let mut fields = Fields::new();
        fields.insert(ACL.to_string(), Value::String(acl.to_string()));
        fields.insert(BUCKET.to_string(), Value::String(bucket.to_string()));
        fields.insert(KEY.to_string(), Value::String(path));
        fields.extend(extra);
        fields.extend(metadata);
        Self { fields, body: None }
    }

    pub fn with_body(mut self, body: Content) -> Self {
        self.body = Some(body);
        self
    }

    /// String value of a field, if present and a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn acl(&self) -> Option<&str> {
        self.get_str(ACL)
    }

    pub fn bucket(&self) -> Option<&str> {
        self.get_str(BUCKET)
    }

    /// Object path / 对象路径
    pub fn key(&self) -> Option<&str> {
        self.get_str(KEY)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_str(CONTENT_TYPE)
    }

    pub fn copy_source(&self) -> Option<&str> {
        self.get_str(COPY_SOURCE)
    }
}
