//! S3 对象存储适配器
//!
//! Keys are mapped to object paths below an optional virtual directory and
//! every request goes through an [`ObjectStoreClient`]. [`RustS3Client`] is the
//! rust-s3 backed client used by [`S3AdapterFactory`].

mod bucket;
mod client;
mod config;
mod driver;
mod factory;
mod options;
mod path;

#[cfg(test)]
pub(crate) mod mock;

pub use bucket::RustS3Client;
pub use client::{
    GetObjectOutput, HeadObjectOutput, ListObjectsPage, ListObjectsRequest, ObjectStoreClient,
    ObjectSummary,
};
pub use config::{S3AdapterConfig, S3ClientConfig};
pub use driver::S3Adapter;
pub use factory::S3AdapterFactory;
pub use options::{RequestOptions, ACL, BUCKET, CONTENT_TYPE, COPY_SOURCE, KEY};
pub use path::PathTranslator;
