use std::sync::Arc;

use tracing::instrument;

use crate::config::VARIANTS;
use crate::errors::DeleteError;
use crate::file::FileDescriptor;
use crate::keys::KeyDeriver;
use crate::storage::StorageBackend;

/// Deletes every variant of a file by regenerating the keys used at upload.
pub struct DeletePipeline {
    keys: KeyDeriver,
    storage: Arc<dyn StorageBackend>,
}

impl DeletePipeline {
    pub fn new(keys: KeyDeriver, storage: Arc<dyn StorageBackend>) -> Self {
        Self { keys, storage }
    }

    /// Stops at the first failed delete, variants already removed stay removed.
    #[instrument(name = "delete", skip_all, fields(identity = %file.identity))]
    pub async fn run(&self, file: &FileDescriptor) -> Result<(), DeleteError> {
        if file.identity.is_empty() {
            return Err(DeleteError::MissingIdentity);
        }

        for variant in VARIANTS.iter() {
            let key = self.keys.derive(file, variant);

            self.storage
                .delete(&key)
                .await
                .map_err(|source| DeleteError::Store {
                    variant: variant.name,
                    key: key.clone(),
                    source,
                })?;

            debug!("deleted variant {} @ {}", variant.name, &key);
        }

        Ok(())
    }
}
