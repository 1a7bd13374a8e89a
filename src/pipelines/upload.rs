use std::sync::Arc;

use image::DynamicImage;
use tracing::instrument;

use crate::config::{Variant, VARIANTS};
use crate::errors::UploadError;
use crate::file::FileDescriptor;
use crate::keys::KeyDeriver;
use crate::processor::{self, VariantEncoder};
use crate::storage::{StorageBackend, StoredObject};

/// Decodes a file once then encodes and stores every variant in order.
pub struct UploadPipeline {
    keys: KeyDeriver,
    encoder: Arc<dyn VariantEncoder>,
    storage: Arc<dyn StorageBackend>,
    public: bool,
    base_url: Option<String>,
}

impl UploadPipeline {
    pub fn new(
        keys: KeyDeriver,
        encoder: Arc<dyn VariantEncoder>,
        storage: Arc<dyn StorageBackend>,
        public: bool,
        base_url: Option<String>,
    ) -> Self {
        Self {
            keys,
            encoder,
            storage,
            public,
            base_url,
        }
    }

    /// Stores each variant and attaches its URL to `file` under the variant name.
    ///
    /// Variants are processed one after the other. The first failure stops
    /// the run and nothing already stored is rolled back, so `file` keeps the
    /// URLs of every variant that made it before the failure.
    #[instrument(name = "upload", skip_all, fields(identity = %file.identity))]
    pub async fn run(&self, file: &mut FileDescriptor) -> Result<(), UploadError> {
        if file.identity.is_empty() {
            return Err(UploadError::MissingIdentity);
        }

        let source = processor::decode(file.content.clone()).await?;
        debug!("decoded source {}x{}", source.width(), source.height());

        for variant in VARIANTS.iter() {
            let url = self.store_variant(file, variant, source.clone()).await?;
            file.urls.insert(variant.name.to_string(), url);
        }

        Ok(())
    }

    async fn store_variant(
        &self,
        file: &FileDescriptor,
        variant: &Variant,
        image: Arc<DynamicImage>,
    ) -> Result<String, UploadError> {
        let key = self.keys.derive(file, variant);

        let data = self
            .encoder
            .encode(image, variant.width, variant.quality)
            .await
            .map_err(|source| UploadError::Encode {
                variant: variant.name,
                source,
            })?;

        let size = data.len();
        let stored = self
            .storage
            .put(&key, data, mime::IMAGE_JPEG.as_ref(), self.public)
            .await
            .map_err(|source| UploadError::Store {
                variant: variant.name,
                key: key.clone(),
                source,
            })?;

        debug!("stored variant {} @ {} ({} bytes)", variant.name, &key, size);
        Ok(self.resolve_url(&key, stored))
    }

    #[inline]
    fn resolve_url(&self, key: &str, stored: StoredObject) -> String {
        match self.base_url.as_deref() {
            Some(base) => format!("{}/{}", base, key),
            None => stored.location,
        }
    }
}
