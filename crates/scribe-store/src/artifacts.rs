use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::StoreError;

/// Flat filesystem store for rendered PDF artifacts. Names are sanitized
/// on write; reads refuse any name whose sanitized form differs, so a
/// crafted `../` name can never escape the root directory.
#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root)
            .map_err(|e| StoreError::Io(format!("create artifact dir: {e}")))?;
        Ok(Self { root: root.to_owned() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an artifact, returning the sanitized name it was stored under
    /// and its size in bytes.
    #[instrument(skip(self, bytes), fields(name, size = bytes.len()))]
    pub fn store(&self, name: &str, bytes: &[u8]) -> Result<(String, u64), StoreError> {
        let safe = sanitize_file_name(name);
        if safe.is_empty() {
            return Err(StoreError::Io(format!("unusable artifact name: {name:?}")));
        }
        let path = self.root.join(&safe);
        std::fs::write(&path, bytes)
            .map_err(|e| StoreError::Io(format!("write artifact {safe}: {e}")))?;
        info!(name = %safe, size = bytes.len(), "artifact stored");
        Ok((safe, bytes.len() as u64))
    }

    /// Read an artifact back. Names that sanitize differently are treated
    /// as missing rather than resolved.
    #[instrument(skip(self), fields(name))]
    pub fn retrieve(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        if name.is_empty() || sanitize_file_name(name) != name {
            return Err(StoreError::NotFound(format!("artifact {name:?}")));
        }
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(format!("artifact {name:?}"))
            } else {
                StoreError::Io(format!("read artifact {name}: {e}"))
            }
        })
    }

}

/// Keep only `[A-Za-z0-9._-]`; everything else becomes `_`. Leading dots
/// are stripped so names can never be hidden files or `..`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}
