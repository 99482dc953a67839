//! Uploaded file storage for Loris.
//!
//! Page assets and news images are uploaded once and copied into every
//! generated site tree. This crate provides the [`MediaStorage`] trait that
//! hides where uploads live:
//!
//! - [`FsMediaStorage`] keeps them under a directory on disk
//! - [`MockMediaStorage`] keeps them in memory (behind the `mock` feature)
//!
//! Keys are `/`-separated relative paths such as
//! `assets/3f0c…/style.css`. [`upload_key`] builds fresh keys so two uploads
//! with the same filename never overwrite each other.

mod error;
mod fs;
#[cfg(feature = "mock")]
mod mock;

pub use error::{MediaError, MediaErrorKind};
pub use fs::FsMediaStorage;
#[cfg(feature = "mock")]
pub use mock::MockMediaStorage;

/// Storage for uploaded file content.
pub trait MediaStorage: Send + Sync {
    /// Read the full content stored under `key`.
    fn read(&self, key: &str) -> Result<Vec<u8>, MediaError>;

    /// Store `content` under `key`, replacing any previous content.
    fn write(&self, key: &str, content: &[u8]) -> Result<(), MediaError>;

    /// Check whether content exists under `key`. Errors count as "no".
    fn exists(&self, key: &str) -> bool;

    /// Remove the content stored under `key`.
    fn delete(&self, key: &str) -> Result<(), MediaError>;
}

/// Build a fresh key for an upload: `{prefix}/{uuid}/{filename}`.
pub fn upload_key(prefix: &str, filename: &str) -> String {
    format!("{prefix}/{}/{filename}", uuid::Uuid::new_v4().simple())
}

/// Check that a key is a plain relative path.
pub fn validate_key(key: &str) -> Result<(), MediaError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|s| s.is_empty() || s == "." || s == "..");
    if bad {
        return Err(MediaError::invalid_key(key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key_shape() {
        let key = upload_key("assets", "style.css");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "assets");
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2], "style.css");
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_upload_keys_are_unique() {
        assert_ne!(upload_key("news", "a.jpg"), upload_key("news", "a.jpg"));
    }

    #[test]
    fn test_validate_key_rejects_escapes() {
        for key in ["", "/etc/passwd", "../x", "a/../b", "a//b", "a\\b", "./a"] {
            let err = validate_key(key).unwrap_err();
            assert_eq!(err.kind, MediaErrorKind::InvalidKey, "key: {key}");
        }
    }
}
