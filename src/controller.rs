use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::config::RuntimeConfig;
use crate::errors::{DeleteError, UploadError};
use crate::file::FileDescriptor;
use crate::keys::KeyDeriver;
use crate::pipelines::{DeletePipeline, UploadPipeline};
use crate::processor::{JpegVariantEncoder, VariantEncoder};
use crate::storage::StorageBackend;

#[derive(Debug, Copy, Clone)]
pub struct UploadInfo {
    /// The time spent processing the image in seconds.
    pub processing_time: f32,

    /// The crc32 checksum of the uploaded image.
    pub checksum: u32,
}

/// Owns the pipelines for one configured destination.
pub struct MediaController {
    global_limiter: Option<Arc<Semaphore>>,
    max_upload_size: Option<usize>,
    upload: UploadPipeline,
    delete: DeletePipeline,
}

impl MediaController {
    pub fn new(config: &RuntimeConfig, storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_encoder(config, storage, Arc::new(JpegVariantEncoder))
    }

    pub fn with_encoder(
        config: &RuntimeConfig,
        storage: Arc<dyn StorageBackend>,
        encoder: Arc<dyn VariantEncoder>,
    ) -> Self {
        let keys = KeyDeriver::new(&config.prefix);
        info!(
            prefix = keys.prefix(),
            public = config.public,
            "Configured media pipelines"
        );

        let global_limiter = config
            .max_concurrency
            .map(Semaphore::new)
            .map(Arc::new);

        Self {
            global_limiter,
            max_upload_size: config.max_upload_size,
            upload: UploadPipeline::new(
                keys.clone(),
                encoder,
                storage.clone(),
                config.public,
                config.base_url(),
            ),
            delete: DeletePipeline::new(keys, storage),
        }
    }

    #[inline]
    pub fn max_upload_size(&self) -> Option<usize> {
        self.max_upload_size
    }

    async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        match self.global_limiter.as_ref() {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        }
    }

    pub async fn upload(&self, file: &mut FileDescriptor) -> Result<UploadInfo, UploadError> {
        let _permit = self.acquire().await;

        let checksum = crate::utils::crc_hash(&file.content);
        let start = Instant::now();
        let result = self.upload.run(file).await;
        let processing_time = start.elapsed().as_secs_f32();

        match result {
            Ok(()) => {
                info!(
                    identity = %file.identity,
                    processing_time,
                    "Uploaded {} variants",
                    file.urls.len()
                );
                Ok(UploadInfo {
                    processing_time,
                    checksum,
                })
            },
            Err(e) => {
                error!(
                    identity = %file.identity,
                    stored = file.urls.len(),
                    error = ?e,
                    "Upload failed"
                );
                Err(e)
            },
        }
    }

    pub async fn remove(&self, file: &FileDescriptor) -> Result<(), DeleteError> {
        let _permit = self.acquire().await;

        if let Err(e) = self.delete.run(file).await {
            error!(identity = %file.identity, error = ?e, "Delete failed");
            return Err(e);
        }

        info!(identity = %file.identity, "Deleted all variants");
        Ok(())
    }
}
