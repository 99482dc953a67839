//! Instantiation errors.

use std::path::PathBuf;

use loris_media::MediaError;
use loris_model::ModelError;

/// Error returned while instantiating a site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// The template references files that are not registered as assets.
    #[error("Page assets in template not registered for {page}: {}", .missing.join(", "))]
    MissingAssets { page: String, missing: Vec<String> },
    /// A template reference or stored path climbs out of the site root.
    #[error("Invalid reference in {page}: {source}")]
    InvalidReference { page: String, source: ModelError },
    /// A stored asset or image location would be written outside the site.
    #[error("Invalid asset location {path}: {source}")]
    InvalidAsset { path: String, source: ModelError },
    /// Two published pages register an asset at the same site path.
    #[error("Asset {path} is registered on more than one page")]
    DuplicateAsset { path: String },
    /// The index page binds news items but the site has no news page.
    #[error("Index page of site {site} shows news but no news page is defined")]
    NewsPageMissing { site: String },
    #[error("Failed to render {page}: {source}")]
    Render {
        page: String,
        source: minijinja::Error,
    },
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SiteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
