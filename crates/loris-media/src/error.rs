//! Media storage error type.

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaErrorKind {
    /// No content stored under the key.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Key is empty, absolute or climbs out of the media root.
    InvalidKey,
    /// Other/unknown error category.
    Other,
}

/// Media storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct MediaError {
    /// Semantic error category.
    pub kind: MediaErrorKind,
    /// Key context (if applicable).
    pub key: Option<String>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MediaError {
    #[must_use]
    pub fn new(kind: MediaErrorKind) -> Self {
        Self {
            kind,
            key: None,
            backend: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::new(MediaErrorKind::NotFound).with_key(key)
    }

    #[must_use]
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::new(MediaErrorKind::InvalidKey).with_key(key)
    }

    /// Create a media error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, key: &str) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => MediaErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => MediaErrorKind::PermissionDenied,
            _ => MediaErrorKind::Other,
        };
        Self::new(kind).with_key(key).with_source(err)
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: source (key: assets/x.css)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            MediaErrorKind::NotFound => "Not found",
            MediaErrorKind::PermissionDenied => "Permission denied",
            MediaErrorKind::InvalidKey => "Invalid key",
            MediaErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }
        Ok(())
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
