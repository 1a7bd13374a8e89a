use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::StoreError;

/// The result of a successful put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Where the backend says the object can be reached.
    pub location: String,
}

/// An object store addressed by key.
///
/// Both operations are idempotent, putting an existing key overwrites it
/// and deleting a missing key is left to the backend's own semantics.
#[async_trait]
pub trait StorageBackend: Sync + Send + 'static {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        public: bool,
    ) -> Result<StoredObject, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
