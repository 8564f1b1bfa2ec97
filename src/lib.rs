pub mod content_type;
pub mod error;
pub mod storage;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use drivers::s3::{S3Adapter, S3AdapterConfig, S3AdapterFactory};
pub use error::{BackendError, Result, StorageError};
