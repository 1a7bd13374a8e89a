use std::fs::read_to_string;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::storage::backends::BackendConfigs;

/// A named rendition of the source image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Variant {
    /// The name of the variant, used both in the object key and
    /// as the field the resulting URL is attached under.
    pub name: &'static str,

    /// The width to resize to, the height follows the aspect ratio.
    pub width: u32,

    /// The JPEG quality (0-100).
    ///
    /// Falls back to the encoder default when `None`.
    pub quality: Option<u8>,
}

/// The full size rendition, capped at 1920px wide.
pub const URL: Variant = Variant {
    name: "url",
    width: 1920,
    quality: Some(80),
};

/// The thumbnail rendition.
pub const THUMB: Variant = Variant {
    name: "thumb",
    width: 400,
    quality: Some(60),
};

/// Every variant, in the order they are uploaded and deleted.
pub const VARIANTS: [Variant; 2] = [URL, THUMB];

#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    /// The set storage backend configuration.
    pub backend: BackendConfigs,

    #[serde(default)]
    /// The prefix prepended to every object key, e.g. `uploads/`.
    ///
    /// Surrounding whitespace is ignored and a lone `/` is treated
    /// as no prefix at all.
    pub prefix: String,

    #[serde(default)]
    /// Request `public-read` visibility on every stored object.
    ///
    /// Defaults to `false`.
    pub public: bool,

    #[serde(default)]
    /// The base URL used to build the public URL of each variant,
    /// e.g. a CDN in front of the bucket.
    ///
    /// When unset, the location reported by the backend is used.
    pub base_url: Option<String>,

    #[serde(default)]
    /// The maximum size of an upload in bytes.
    ///
    /// No limit is applied if this is `None`.
    pub max_upload_size: Option<usize>,

    #[serde(default)]
    /// The maximum number of uploads and deletes processed at once.
    ///
    /// No limit is applied if this is `None`.
    pub max_concurrency: Option<usize>,
}

impl RuntimeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.backend.validate()?;

        if self.max_concurrency == Some(0) {
            return Err(anyhow!("max_concurrency must be at least 1 when set"));
        }

        Ok(())
    }

    /// The base URL with surrounding whitespace and trailing slashes removed.
    ///
    /// An empty base URL is the same as an unset one.
    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(String::from)
    }
}
