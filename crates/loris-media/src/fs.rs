//! Filesystem-backed media storage.

use std::fs;
use std::path::PathBuf;

use crate::{MediaError, MediaStorage, validate_key};

const BACKEND: &str = "Fs";

/// Stores uploads as files below a root directory.
#[derive(Debug, Clone)]
pub struct FsMediaStorage {
    root: PathBuf,
}

impl FsMediaStorage {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, MediaError> {
        validate_key(key).map_err(|e| e.with_backend(BACKEND))?;
        Ok(self.root.join(key))
    }
}

impl MediaStorage for FsMediaStorage {
    fn read(&self, key: &str) -> Result<Vec<u8>, MediaError> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| MediaError::io(e, key).with_backend(BACKEND))
    }

    fn write(&self, key: &str, content: &[u8]) -> Result<(), MediaError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MediaError::io(e, key).with_backend(BACKEND))?;
        }
        fs::write(&path, content).map_err(|e| MediaError::io(e, key).with_backend(BACKEND))?;
        tracing::debug!(key, bytes = content.len(), "Stored upload");
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_ok_and(|path| path.is_file())
    }

    fn delete(&self, key: &str) -> Result<(), MediaError> {
        let path = self.path_for(key)?;
        fs::remove_file(&path).map_err(|e| MediaError::io(e, key).with_backend(BACKEND))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::MediaErrorKind;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let storage = FsMediaStorage::new(dir.path().to_path_buf());

        storage
            .write("assets/abc/style.css", b"body { margin: 0; }")
            .unwrap();

        assert!(storage.exists("assets/abc/style.css"));
        assert_eq!(
            storage.read("assets/abc/style.css").unwrap(),
            b"body { margin: 0; }"
        );
        assert!(dir.path().join("assets/abc/style.css").is_file());
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = FsMediaStorage::new(dir.path().to_path_buf());

        let err = storage.read("assets/missing.css").unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
        assert!(!storage.exists("assets/missing.css"));
    }

    #[test]
    fn test_invalid_key_never_touches_disk() {
        let dir = TempDir::new().unwrap();
        let storage = FsMediaStorage::new(dir.path().join("media"));

        let err = storage.write("../escape.txt", b"x").unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::InvalidKey);
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let storage = FsMediaStorage::new(dir.path().to_path_buf());
        storage.write("news/a/photo.jpeg", b"jpeg").unwrap();

        storage.delete("news/a/photo.jpeg").unwrap();

        assert!(!storage.exists("news/a/photo.jpeg"));
    }
}
