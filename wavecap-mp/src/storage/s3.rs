//! S3/MinIO gateway implementation
//!
//! Object reads and writes go through the `object_store` AWS adapter
//! (path-style addressing, plain HTTP allowed for MinIO).
//! `object_store` exposes no bucket-creation operation, so
//! `ensure_bucket` issues one SigV4-signed `PUT /{bucket}` REST call
//! directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as StorePath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use wavecap_common::{Error, Result};

use super::ObjectGateway;
use crate::config::StorageConfig;

/// SHA-256 of an empty body, needed for signing zero-length requests.
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

type HmacSha256 = Hmac<Sha256>;

/// Gateway backed by an S3-compatible store (MinIO in deployment).
pub struct S3Gateway {
    config: StorageConfig,
    http: reqwest::Client,
    /// One object_store client per bucket, built on first use.
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3Gateway {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        Ok(Self {
            config,
            http,
            stores: Mutex::new(HashMap::new()),
        })
    }

    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| Error::StorageUnavailable("gateway store cache poisoned".into()))?;

        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store = AmazonS3Builder::new()
            .with_endpoint(&self.config.endpoint)
            .with_bucket_name(bucket)
            .with_access_key_id(&self.config.access_key)
            .with_secret_access_key(&self.config.secret_key)
            .with_region(&self.config.region)
            .with_allow_http(true)
            .with_virtual_hosted_style_request(false)
            .build()
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        let store: Arc<dyn ObjectStore> = Arc::new(store);
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }

    fn endpoint_host(&self) -> &str {
        self.config
            .endpoint
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/')
    }
}

#[async_trait]
impl ObjectGateway for S3Gateway {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let store = self.store_for(bucket)?;
        let path = StorePath::from(key);

        let result = store.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                Error::NotFound(format!("{}/{}", bucket, key))
            }
            other => Error::StorageUnavailable(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        debug!(bucket, key, len = bytes.len(), "Fetched object");
        Ok(bytes.to_vec())
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()> {
        let store = self.store_for(bucket)?;
        let path = StorePath::from(key);
        let len = bytes.len();

        let mut opts = PutOptions::default();
        opts.attributes =
            Attributes::from_iter([(Attribute::ContentType, content_type.to_string())]);

        store
            .put_opts(&path, PutPayload::from(bytes), opts)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        debug!(bucket, key, len, content_type, "Stored object");
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let host = self.endpoint_host().to_string();

        let authorization = sign_create_bucket(
            &host,
            bucket,
            &self.config.region,
            &self.config.access_key,
            &self.config.secret_key,
            &amz_date,
            &date_stamp,
        )?;

        let url = format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            bucket
        );

        let response = self
            .http
            .put(&url)
            .header("Host", &host)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(bucket, "Bucket created");
            return Ok(());
        }
        // 409 means the bucket already exists (BucketAlreadyOwnedByYou)
        if status == reqwest::StatusCode::CONFLICT {
            debug!(bucket, "Bucket already exists");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::StorageUnavailable(format!(
            "create bucket {} failed with {}: {}",
            bucket, status, body
        )))
    }
}

/// Build the SigV4 `Authorization` header for `PUT /{bucket}` with an
/// empty body and `host;x-amz-content-sha256;x-amz-date` signed headers.
fn sign_create_bucket(
    host: &str,
    bucket: &str,
    region: &str,
    access_key: &str,
    secret_key: &str,
    amz_date: &str,
    date_stamp: &str,
) -> Result<String> {
    const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

    let canonical_request = format!(
        "PUT\n/{bucket}\n\nhost:{host}\nx-amz-content-sha256:{payload}\nx-amz-date:{date}\n\n{signed}\n{payload}",
        bucket = bucket,
        host = host,
        date = amz_date,
        signed = SIGNED_HEADERS,
        payload = EMPTY_PAYLOAD_SHA256,
    );

    let scope = format!("{}/{}/s3/aws4_request", date_stamp, region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        hex(&Sha256::digest(canonical_request.as_bytes()))
    );

    let key = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let key = hmac_sha256(&key, region.as_bytes())?;
    let key = hmac_sha256(&key, b"s3")?;
    let key = hmac_sha256(&key, b"aws4_request")?;
    let signature = hex(&hmac_sha256(&key, string_to_sign.as_bytes())?);

    Ok(format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        access_key, scope, SIGNED_HEADERS, signature
    ))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::StorageUnavailable(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encodes_lowercase() {
        assert_eq!(hex(&[0x00, 0xff, 0x1a]), "00ff1a");
    }

    #[test]
    fn signature_is_deterministic() {
        let a = sign_create_bucket(
            "minio-server:9000",
            "media-vtt",
            "us-east-1",
            "minio",
            "minio123",
            "20240101T000000Z",
            "20240101",
        )
        .unwrap();
        let b = sign_create_bucket(
            "minio-server:9000",
            "media-vtt",
            "us-east-1",
            "minio",
            "minio123",
            "20240101T000000Z",
            "20240101",
        )
        .unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("AWS4-HMAC-SHA256 Credential=minio/20240101/us-east-1/s3/aws4_request"));
        assert!(a.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
    }

    #[test]
    fn signature_depends_on_bucket() {
        let a = sign_create_bucket(
            "h:9000", "bucket-a", "us-east-1", "ak", "sk", "20240101T000000Z", "20240101",
        )
        .unwrap();
        let b = sign_create_bucket(
            "h:9000", "bucket-b", "us-east-1", "ak", "sk", "20240101T000000Z", "20240101",
        )
        .unwrap();
        assert_ne!(a, b);
    }
}
