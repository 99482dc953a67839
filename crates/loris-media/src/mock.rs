//! Mock media storage implementation for testing.
//!
//! Provides [`MockMediaStorage`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{MediaError, MediaStorage, validate_key};

/// In-memory media storage.
///
/// # Example
///
/// ```ignore
/// use loris_media::{MediaStorage, MockMediaStorage};
///
/// let media = MockMediaStorage::new().with_file("assets/a/style.css", "body {}");
/// assert_eq!(media.read("assets/a/style.css").unwrap(), b"body {}");
/// ```
#[derive(Debug, Default)]
pub struct MockMediaStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MockMediaStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, key: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(key.into(), content.into());
        self
    }

    /// Number of stored files.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.files.read().unwrap().is_empty()
    }
}

impl MediaStorage for MockMediaStorage {
    fn read(&self, key: &str) -> Result<Vec<u8>, MediaError> {
        self.files
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| MediaError::not_found(key).with_backend("Mock"))
    }

    fn write(&self, key: &str, content: &[u8]) -> Result<(), MediaError> {
        validate_key(key).map_err(|e| e.with_backend("Mock"))?;
        self.files
            .write()
            .unwrap()
            .insert(key.to_owned(), content.to_vec());
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.files.read().unwrap().contains_key(key)
    }

    fn delete(&self, key: &str) -> Result<(), MediaError> {
        self.files
            .write()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| MediaError::not_found(key).with_backend("Mock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaErrorKind;

    #[test]
    fn test_with_file_and_read() {
        let media = MockMediaStorage::new().with_file("assets/a/style.css", "body {}");
        assert_eq!(media.read("assets/a/style.css").unwrap(), b"body {}");
        assert_eq!(media.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let media = MockMediaStorage::new();
        let err = media.read("nope").unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::NotFound);
        assert_eq!(err.backend, Some("Mock"));
        assert!(media.is_empty());
    }
}
