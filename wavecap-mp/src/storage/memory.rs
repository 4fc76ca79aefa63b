//! In-memory gateway for tests and local development

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use wavecap_common::{Error, Result};

use super::ObjectGateway;

/// HashMap-backed `ObjectGateway`. Objects live under
/// `(bucket, key)`; buckets are tracked so `ensure_bucket` semantics
/// (idempotent creation) can be exercised.
#[derive(Default)]
pub struct MemoryGateway {
    buckets: RwLock<HashSet<String>>,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: inspect a stored object.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Test helper: number of stored objects across all buckets.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Test helper: remove an object.
    pub async fn remove(&self, bucket: &str, key: &str) {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
    }
}

#[async_trait]
impl ObjectGateway for MemoryGateway {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.bytes.clone())
            .ok_or_else(|| Error::NotFound(format!("{}/{}", bucket, key)))
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()> {
        self.objects.write().await.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        self.buckets.write().await.insert(bucket.to_string());
        Ok(())
    }
}
