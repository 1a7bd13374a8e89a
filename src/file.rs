use bytes::Bytes;
use hashbrown::HashMap;

/// A single uploaded source image along with the URLs of the
/// variants that have been stored for it so far.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// The stable identity (hash) of the file, used as the key stem.
    pub identity: String,

    /// An optional logical path the variants are nested under.
    ///
    /// An empty path is treated the same as no path.
    pub path: Option<String>,

    /// The raw, undecoded image data.
    pub content: Bytes,

    /// Variant name -> public URL, filled in as variants are stored.
    pub urls: HashMap<String, String>,
}

impl FileDescriptor {
    pub fn new(identity: impl Into<String>, path: Option<String>, content: Bytes) -> Self {
        Self {
            identity: identity.into(),
            path,
            content,
            urls: HashMap::new(),
        }
    }

    /// The path segment if one is set and non-empty.
    #[inline]
    pub fn path_segment(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    #[inline]
    pub fn url(&self, variant: &str) -> Option<&str> {
        self.urls.get(variant).map(String::as_str)
    }
}
