use crate::config::Variant;
use crate::file::FileDescriptor;

/// Builds object keys for stored variants.
///
/// Keys take the form `{prefix}{path}/{identity}_{variant}.jpg` and depend on
/// nothing but their inputs, which lets a delete regenerate exactly the keys
/// an upload wrote without any persisted state.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    prefix: String,
}

impl KeyDeriver {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim();
        let prefix = if prefix == "/" { "" } else { prefix };

        Self {
            prefix: prefix.to_string(),
        }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn derive(&self, file: &FileDescriptor, variant: &Variant) -> String {
        match file.path_segment() {
            Some(path) => format!(
                "{}{}/{}_{}.jpg",
                self.prefix, path, file.identity, variant.name,
            ),
            None => format!("{}{}_{}.jpg", self.prefix, file.identity, variant.name),
        }
    }
}
