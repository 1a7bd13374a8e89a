use std::sync::Arc;

use bytes::Bytes;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::{Binary, Json, PlainText};
use poem_openapi::{ApiResponse, Object, OpenApi};
use uuid::Uuid;

use crate::config::VARIANTS;
use crate::controller::MediaController;
use crate::errors::{DeleteError, UploadError};
use crate::file::FileDescriptor;

#[derive(Object, Debug)]
pub struct VariantUrl {
    /// The name of the variant, e.g. `url` or `thumb`.
    variant: String,

    /// Where the variant can be accessed.
    url: String,
}

#[derive(Object, Debug)]
pub struct UploadedFile {
    /// The identity the variants are stored under.
    ///
    /// This is needed to delete the file again.
    identity: String,

    /// The path the variants are nested under, if any.
    path: Option<String>,

    /// The stored variants in upload order.
    urls: Vec<VariantUrl>,

    /// The time spent processing the image in seconds.
    processing_time: f32,

    /// The crc32 checksum of the uploaded image.
    checksum: u32,
}

#[derive(ApiResponse)]
pub enum UploadResponse {
    /// Every variant was stored.
    #[oai(status = 200)]
    Ok(Json<UploadedFile>),

    /// The upload is not a readable image.
    #[oai(status = 400)]
    InvalidImage(PlainText<String>),

    /// The upload exceeds the configured size limit.
    #[oai(status = 413)]
    TooBig,

    /// A variant could not be encoded.
    #[oai(status = 500)]
    EncodeFailed(PlainText<String>),

    /// The storage backend rejected a variant.
    ///
    /// Variants stored before the failure are not removed.
    #[oai(status = 502)]
    StorageFailed(PlainText<String>),
}

#[derive(ApiResponse)]
pub enum DeleteResponse {
    /// Every variant was deleted.
    #[oai(status = 200)]
    Ok,

    /// The file identity was empty.
    #[oai(status = 400)]
    InvalidIdentity(PlainText<String>),

    /// The storage backend rejected a delete.
    #[oai(status = 502)]
    StorageFailed(PlainText<String>),
}

pub struct MediaApi {
    controller: Arc<MediaController>,
}

impl MediaApi {
    pub fn new(controller: Arc<MediaController>) -> Self {
        Self { controller }
    }
}

#[OpenApi]
impl MediaApi {
    /// Upload Image
    ///
    /// Resizes the image into every variant, encodes each as JPEG and stores
    /// them. If no identity is given a random one is generated.
    #[oai(path = "/upload", method = "post")]
    pub async fn upload(
        &self,
        identity: Query<Option<String>>,
        path: Query<Option<String>>,
        file: Binary<Vec<u8>>,
    ) -> UploadResponse {
        if let Some(limit) = self.controller.max_upload_size() {
            if file.0.len() > limit {
                return UploadResponse::TooBig;
            }
        }

        let identity = identity
            .0
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_simple().to_string());
        let mut descriptor = FileDescriptor::new(identity, path.0, Bytes::from(file.0));

        let info = match self.controller.upload(&mut descriptor).await {
            Ok(info) => info,
            Err(e @ UploadError::MissingIdentity) | Err(e @ UploadError::Decode(_)) => {
                return UploadResponse::InvalidImage(PlainText(e.to_string()))
            },
            Err(e @ UploadError::Encode { .. }) => {
                return UploadResponse::EncodeFailed(PlainText(error_chain(&e)))
            },
            Err(e @ UploadError::Store { .. }) => {
                return UploadResponse::StorageFailed(PlainText(error_chain(&e)))
            },
        };

        let urls = VARIANTS
            .iter()
            .filter_map(|variant| {
                descriptor.url(variant.name).map(|url| VariantUrl {
                    variant: variant.name.to_string(),
                    url: url.to_string(),
                })
            })
            .collect();

        UploadResponse::Ok(Json(UploadedFile {
            identity: descriptor.identity,
            path: descriptor.path,
            urls,
            processing_time: info.processing_time,
            checksum: info.checksum,
        }))
    }

    /// Delete Image
    ///
    /// Deletes every variant stored for the given identity and path.
    #[oai(path = "/:identity", method = "delete")]
    pub async fn delete(
        &self,
        identity: Path<String>,
        path: Query<Option<String>>,
    ) -> DeleteResponse {
        let descriptor = FileDescriptor::new(identity.0, path.0, Bytes::new());

        match self.controller.remove(&descriptor).await {
            Ok(()) => DeleteResponse::Ok,
            Err(e @ DeleteError::MissingIdentity) => {
                DeleteResponse::InvalidIdentity(PlainText(e.to_string()))
            },
            Err(e @ DeleteError::Store { .. }) => {
                DeleteResponse::StorageFailed(PlainText(error_chain(&e)))
            },
        }
    }
}

/// The error message followed by its cause.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
