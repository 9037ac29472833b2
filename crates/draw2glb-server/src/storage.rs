//! Flat directory of uploaded drawings keyed by opaque file ids.
//!
//! An id is a random UUID (hex) followed by the upload's lowercase
//! extension, e.g. `3f2a...c1.pdf`; the extension later selects the parser.

use std::path::{Path, PathBuf};

const DEFAULT_SUFFIX: &str = ".pdf";
const MAX_SUFFIX_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file_id")]
    InvalidId,
    #[error("file not found")]
    NotFound,
    #[error("storage I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Suffix kept from the uploaded filename; `.pdf` when there is none usable.
    pub fn suffix_for(filename: Option<&str>) -> String {
        let ext = filename
            .map(Path::new)
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .filter(|e| {
                !e.is_empty() && e.len() <= MAX_SUFFIX_LEN && e.chars().all(|c| c.is_ascii_alphanumeric())
            });
        match ext {
            Some(e) => format!(".{}", e.to_ascii_lowercase()),
            None => DEFAULT_SUFFIX.to_string(),
        }
    }

    pub fn put(&self, bytes: &[u8], suffix: &str) -> Result<String, StorageError> {
        let file_id = format!("{}{}", uuid::Uuid::new_v4().simple(), suffix);
        let path = self.root.join(&file_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(file_id)
    }

    pub fn path_for(&self, file_id: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_id(file_id) {
            return Err(StorageError::InvalidId);
        }
        let path = self.root.join(file_id);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::NotFound)
        }
    }

    pub fn read(&self, file_id: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(file_id)?;
        Ok(std::fs::read(path)?)
    }
}

/// Ids never leave the storage directory: no separators, no leading dot.
fn is_valid_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && file_id.len() <= 64
        && !file_id.starts_with('.')
        && !file_id.contains("..")
        && file_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_keeps_lowercase_extension() {
        assert_eq!(".png", Storage::suffix_for(Some("Scan.PNG")));
        assert_eq!(".pdf", Storage::suffix_for(Some("drawing")));
        assert_eq!(".pdf", Storage::suffix_for(None));
        assert_eq!(".pdf", Storage::suffix_for(Some("x.p$f")));
    }

    #[test]
    fn put_then_read_round_trips_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::open(tmp.path().join("uploads")).unwrap();

        let id = storage.put(b"hello", ".svg").unwrap();
        assert!(id.ends_with(".svg"));
        assert_eq!(32 + 4, id.len());
        assert_eq!(b"hello".to_vec(), storage.read(&id).unwrap());
        assert_eq!(storage.root().join(&id), storage.path_for(&id).unwrap());
        assert!(tmp.path().join("uploads").is_dir());
    }

    #[test]
    fn rejects_traversal_and_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::open(tmp.path()).unwrap();

        assert!(matches!(storage.path_for("../secret"), Err(StorageError::InvalidId)));
        assert!(matches!(storage.path_for("a/b.pdf"), Err(StorageError::InvalidId)));
        assert!(matches!(storage.path_for(".hidden"), Err(StorageError::InvalidId)));
        assert!(matches!(storage.path_for(""), Err(StorageError::InvalidId)));
        assert!(matches!(storage.path_for("deadbeef.pdf"), Err(StorageError::NotFound)));
    }
}
