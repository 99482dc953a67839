//! CLI command implementations.

mod asset;
mod migrate;
mod news;
mod org;
mod page;
mod site;
mod user;

use std::path::PathBuf;

use clap::Args;
use loris_config::{CliSettings, Config};
use loris_db::Database;
use loris_media::FsMediaStorage;
use loris_model::OrganizationUser;
use loris_site::InstantiateSettings;

pub(crate) use asset::AssetCommand;
pub(crate) use migrate::MigrateArgs;
pub(crate) use news::NewsCommand;
pub(crate) use org::OrgCommand;
pub(crate) use page::PageCommand;
pub(crate) use site::SiteCommand;
pub(crate) use user::UserCommand;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover loris.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (INFO level logging).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Username recorded as creator/updater of changed records.
    #[arg(long, global = true, env = "LORIS_USER")]
    pub as_user: Option<String>,

    /// Database URL (overrides config).
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory holding uploaded files (overrides config).
    #[arg(long, global = true)]
    media_dir: Option<PathBuf>,

    /// S3-compatible endpoint URL (overrides config).
    #[arg(long, global = true, env = "S3_ENDPOINT_URL")]
    s3_endpoint: Option<String>,

    /// AWS region (overrides config).
    #[arg(long, global = true, env = "AWS_DEFAULT_REGION")]
    s3_region: Option<String>,

    /// Latest news items shown on index pages (overrides config).
    #[arg(long, global = true, env = "MAX_INDEX_NEWSITEMS")]
    max_index_news_items: Option<usize>,

    /// News items per news page (overrides config).
    #[arg(long, global = true, env = "NEWS_ITEMS_PER_PAGE")]
    news_items_per_page: Option<usize>,
}

impl GlobalArgs {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            database_url: self.database_url.clone(),
            media_dir: self.media_dir.clone(),
            s3_endpoint: self.s3_endpoint.clone(),
            s3_region: self.s3_region.clone(),
            max_index_news_items: self.max_index_news_items,
            news_items_per_page: self.news_items_per_page,
        }
    }
}

/// Loaded configuration and an open database.
pub(crate) struct Session {
    pub config: Config,
    pub db: Database,
}

impl Session {
    pub(crate) async fn open(global: &GlobalArgs) -> Result<Self, CliError> {
        let config = Config::load(global.config.as_deref(), Some(&global.cli_settings()))?;
        let db = Database::connect(&config.database_resolved.url).await?;
        Ok(Self { config, db })
    }

    /// The user named by `--as-user`.
    pub(crate) async fn actor(&self, global: &GlobalArgs) -> Result<OrganizationUser, CliError> {
        let username = global.as_user.as_deref().ok_or_else(|| {
            CliError::Validation(
                "This command changes records: pass --as-user <USERNAME> or set LORIS_USER"
                    .to_owned(),
            )
        })?;
        Ok(self.db.require_user(username).await?)
    }

    pub(crate) fn media(&self) -> FsMediaStorage {
        FsMediaStorage::new(self.config.media_resolved.dir.clone())
    }

    pub(crate) fn instantiate_settings(&self) -> InstantiateSettings {
        InstantiateSettings {
            max_index_news_items: self.config.news.max_index_items,
            news_items_per_page: self.config.news.items_per_page,
        }
    }
}

/// Final path component of `path` as a UTF-8 filename.
pub(crate) fn file_name(path: &std::path::Path) -> Result<String, CliError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CliError::Validation(format!("Not a file path: {}", path.display())))
}
