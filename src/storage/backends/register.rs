use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use serde::Deserialize;
use strum::{Display, EnumString};

use crate::storage::StorageBackend;

/// The S3 compatible provider hosting the bucket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    Aws,
    Wasabi,
}

impl Default for Provider {
    fn default() -> Self {
        Self::Aws
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendConfigs {
    S3 {
        #[serde(default)]
        provider: Provider,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        bucket: String,
        #[serde(default)]
        access_key: Option<String>,
        #[serde(default)]
        secret_key: Option<String>,
    },
    FileSystem {
        directory: PathBuf,
    },
}

impl BackendConfigs {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            Self::S3 {
                region,
                bucket,
                access_key,
                secret_key,
                ..
            } => {
                if bucket.trim().is_empty() {
                    return Err(anyhow!("s3 backend requires a bucket"));
                }

                if region.trim().is_empty() {
                    return Err(anyhow!("s3 backend requires a region"));
                }

                if access_key.is_some() != secret_key.is_some() {
                    return Err(anyhow!(
                        "access_key and secret_key must either both be set or both be omitted"
                    ));
                }

                Ok(())
            },
            Self::FileSystem { directory } => {
                if directory.as_os_str().is_empty() {
                    return Err(anyhow!("filesystem backend requires a directory"));
                }

                Ok(())
            },
        }
    }

    pub async fn connect(&self) -> anyhow::Result<Arc<dyn StorageBackend>> {
        match self {
            Self::S3 {
                provider,
                region,
                endpoint,
                bucket,
                access_key,
                secret_key,
            } => {
                let backend = super::blob_storage::BlobStorageBackend::new(
                    *provider,
                    region,
                    endpoint.as_deref(),
                    bucket,
                    access_key.as_deref(),
                    secret_key.as_deref(),
                )?;
                Ok(Arc::new(backend))
            },
            Self::FileSystem { directory } => {
                Ok(Arc::new(super::filesystem::FileSystemBackend::new(directory.clone())))
            },
        }
    }
}
