//! CLI error types.

use loris_config::ConfigError;
use loris_db::DbError;
use loris_media::MediaError;
use loris_model::ModelError;
use loris_publish::SyncError;
use loris_site::SiteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Db(#[from] DbError),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("{0}")]
    Validation(String),
}
