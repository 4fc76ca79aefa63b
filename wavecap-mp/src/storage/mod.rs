//! Object Storage Gateway
//!
//! Wraps get/put against a content store addressed by (bucket, key).
//! The gateway is a port so the pipeline and HTTP handlers can run
//! against the real S3/MinIO backend or the in-memory fake.

mod memory;
mod s3;

use async_trait::async_trait;
use wavecap_common::Result;

pub use memory::MemoryGateway;
pub use s3::S3Gateway;

/// Content store addressed by (bucket, key).
///
/// Errors: `Error::NotFound` when a requested object is absent,
/// `Error::StorageUnavailable` for connectivity or backend failures.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Fetch an object's bytes.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store an object, overwriting any existing one.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    /// Create the bucket if it does not exist. Idempotent: an
    /// already-existing bucket is success. Called once at startup per
    /// destination bucket, not per write.
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;
}
