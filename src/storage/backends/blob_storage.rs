use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use rusoto_core::credential::{ChainProvider, StaticProvider};
use rusoto_core::{HttpClient, Region};
use rusoto_s3::{DeleteObjectRequest, PutObjectRequest, S3Client, S3};

use crate::errors::StoreError;
use crate::storage::backends::Provider;
use crate::storage::{StorageBackend, StoredObject};

/// The canned ACL requested for public objects.
const PUBLIC_READ: &str = "public-read";

pub struct BlobStorageBackend {
    client: S3Client,
    bucket: String,
    location_base: String,
}

impl BlobStorageBackend {
    pub fn new(
        provider: Provider,
        region: &str,
        endpoint: Option<&str>,
        bucket: &str,
        access_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Result<Self> {
        let bucket = bucket.trim().to_string();
        let region_name = region.trim().to_string();

        let endpoint = match (provider, endpoint) {
            (_, Some(endpoint)) => Some(endpoint.trim().trim_end_matches('/').to_string()),
            (Provider::Wasabi, None) => Some(wasabi_endpoint(&region_name)),
            (Provider::Aws, None) => None,
        };

        let (region, location_base) = match endpoint {
            Some(endpoint) => {
                let location_base = format!("{}/{}", endpoint, bucket);
                let region = Region::Custom {
                    name: region_name,
                    endpoint,
                };
                (region, location_base)
            },
            None => {
                let region: Region = region_name.parse()?;
                let location_base =
                    format!("https://{}.s3.{}.amazonaws.com", bucket, region.name());
                (region, location_base)
            },
        };

        let dispatcher = HttpClient::new()?;
        let client = match (access_key, secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let creds = StaticProvider::new_minimal(
                    access_key.trim().to_string(),
                    secret_key.trim().to_string(),
                );
                S3Client::new_with(dispatcher, creds, region)
            },
            _ => S3Client::new_with(dispatcher, ChainProvider::new(), region),
        };

        info!(
            provider = %provider,
            bucket = %bucket,
            location = %location_base,
            "Connected to blob storage"
        );

        Ok(Self {
            client,
            bucket,
            location_base,
        })
    }

    #[inline]
    fn location_of(&self, key: &str) -> String {
        format!("{}/{}", self.location_base, key)
    }

    fn put_request(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        public: bool,
    ) -> PutObjectRequest {
        PutObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            content_length: Some(body.len() as i64),
            content_type: Some(content_type.to_string()),
            acl: public.then(|| PUBLIC_READ.to_string()),
            body: Some(body.to_vec().into()),
            ..Default::default()
        }
    }
}

#[inline]
fn wasabi_endpoint(region: &str) -> String {
    format!("https://s3.{}.wasabisys.com", region)
}

#[async_trait]
impl StorageBackend for BlobStorageBackend {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        public: bool,
    ) -> Result<StoredObject, StoreError> {
        let size = body.len();
        let request = self.put_request(key, body, content_type, public);

        debug!("Storing object in bucket @ {} ({} bytes, public: {})", key, size, public);
        self.client
            .put_object(request)
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, error = %e, "Put object failed");
                StoreError::Put {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        Ok(StoredObject {
            location: self.location_of(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let request = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            ..Default::default()
        };

        debug!("Purging object in bucket @ {}", key);
        self.client
            .delete_object(request)
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, error = %e, "Delete object failed");
                StoreError::Delete {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        Ok(())
    }
}
