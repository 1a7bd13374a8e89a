use thiserror::Error;

/// The source buffer could not be read as an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode source image: {0}")]
    Image(#[from] image::ImageError),

    #[error("decoder worker exited before responding")]
    WorkerGone,
}

/// Resizing or compressing a variant failed.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("jpeg compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("jpeg encoder aborted: {0}")]
    Aborted(String),

    #[error("variant of {width}x{height} exceeds the maximum jpeg dimension")]
    TooLarge { width: u32, height: u32 },

    #[error("encoder worker exited before responding")]
    WorkerGone,
}

/// A failure reported by the object storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("put object {key} failed: {reason}")]
    Put { key: String, reason: String },

    #[error("delete object {key} failed: {reason}")]
    Delete { key: String, reason: String },

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file identity must not be empty")]
    MissingIdentity,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to encode variant {variant}")]
    Encode {
        variant: &'static str,
        #[source]
        source: EncodeError,
    },

    #[error("failed to store variant {variant} at {key}")]
    Store {
        variant: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("file identity must not be empty")]
    MissingIdentity,

    #[error("failed to delete variant {variant} at {key}")]
    Store {
        variant: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}
