//! Configuration management for Loris.
//!
//! Parses `loris.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `database.url`
//! - `media.dir`
//! - `s3.endpoint` (an empty result disables the custom endpoint)
//! - `s3.region`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override database URL.
    pub database_url: Option<String>,
    /// Override media directory.
    pub media_dir: Option<PathBuf>,
    /// Override S3-compatible endpoint URL.
    pub s3_endpoint: Option<String>,
    /// Override AWS region.
    pub s3_region: Option<String>,
    /// Override number of news items shown on the index page.
    pub max_index_news_items: Option<usize>,
    /// Override number of news items per news page.
    pub news_items_per_page: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "loris.toml";

const DEFAULT_REGION: &str = "ap-northeast-1";
const DEFAULT_MAX_INDEX_NEWS_ITEMS: usize = 6;
const DEFAULT_NEWS_ITEMS_PER_PAGE: usize = 5;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database section (strings as written in TOML).
    database: DatabaseConfigRaw,
    /// Media section (paths as written in TOML).
    media: MediaConfigRaw,
    /// Object storage configuration.
    pub s3: S3Config,
    /// News rendering configuration.
    pub news: NewsConfig,

    /// Resolved database configuration (set after loading).
    #[serde(skip)]
    pub database_resolved: DatabaseConfig,
    /// Resolved media configuration (set after loading).
    #[serde(skip)]
    pub media_resolved: MediaConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DatabaseConfigRaw {
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MediaConfigRaw {
    dir: Option<String>,
}

/// Resolved database configuration.
#[derive(Debug, Default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL (e.g. `sqlite:///srv/loris/loris.db`).
    pub url: String,
}

/// Resolved media configuration with absolute paths.
#[derive(Debug, Default)]
pub struct MediaConfig {
    /// Directory holding uploaded asset and image files.
    pub dir: PathBuf,
}

/// Object storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// S3-compatible endpoint URL (`LocalStack`, `MinIO`). `None` uses AWS.
    pub endpoint: Option<String>,
    /// AWS region.
    pub region: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_owned(),
        }
    }
}

/// News rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Latest published items bound into the index page template.
    pub max_index_items: usize,
    /// Items per generated news page.
    pub items_per_page: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            max_index_items: DEFAULT_MAX_INDEX_NEWS_ITEMS,
            items_per_page: DEFAULT_NEWS_ITEMS_PER_PAGE,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`database.url`").
        field: String,
        /// Error message (e.g., "${`DATABASE_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_positive(value: usize, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `loris.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// result is validated again so overrides cannot sneak in bad values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(url) = &settings.database_url {
            self.database_resolved.url.clone_from(url);
        }
        if let Some(dir) = &settings.media_dir {
            self.media_resolved.dir.clone_from(dir);
        }
        if let Some(endpoint) = &settings.s3_endpoint {
            self.s3.endpoint = (!endpoint.is_empty()).then(|| endpoint.clone());
        }
        if let Some(region) = &settings.s3_region {
            self.s3.region.clone_from(region);
        }
        if let Some(max) = settings.max_index_news_items {
            self.news.max_index_items = max;
        }
        if let Some(per_page) = settings.news_items_per_page {
            self.news.items_per_page = per_page;
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            database: DatabaseConfigRaw::default(),
            media: MediaConfigRaw::default(),
            s3: S3Config::default(),
            news: NewsConfig::default(),
            database_resolved: DatabaseConfig {
                url: default_database_url(base),
            },
            media_resolved: MediaConfig {
                dir: base.join("media"),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.database_resolved.url, "database.url")?;
        if let Some(endpoint) = &self.s3.endpoint {
            require_http_url(endpoint, "s3.endpoint")?;
        }
        require_non_empty(&self.s3.region, "s3.region")?;
        require_positive(self.news.max_index_items, "news.max_index_items")?;
        require_positive(self.news.items_per_page, "news.items_per_page")?;
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = &self.database.url {
            self.database.url = Some(expand::expand_env(url, "database.url")?);
        }
        if let Some(dir) = &self.media.dir {
            self.media.dir = Some(expand::expand_env(dir, "media.dir")?);
        }
        self.s3.endpoint = expand::expand_optional(self.s3.endpoint.as_deref(), "s3.endpoint")?;
        self.s3.region = expand::expand_env(&self.s3.region, "s3.region")?;
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    ///
    /// A relative `sqlite://` database path is anchored the same way as the
    /// media directory so the CLI can be run from any subdirectory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.database_resolved = DatabaseConfig {
            url: match self.database.url.as_deref() {
                Some(url) => resolve_sqlite_url(url, config_dir),
                None => default_database_url(config_dir),
            },
        };
        self.media_resolved = MediaConfig {
            dir: config_dir.join(self.media.dir.as_deref().unwrap_or("media")),
        };
    }
}

fn default_database_url(base: &Path) -> String {
    format!("sqlite://{}", base.join("loris.db").display())
}

fn resolve_sqlite_url(url: &str, config_dir: &Path) -> String {
    match url.strip_prefix("sqlite://") {
        Some(path) if !path.is_empty() && !path.starts_with(':') && Path::new(path).is_relative() => {
            format!("sqlite://{}", config_dir.join(path).display())
        }
        _ => url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/srv/loris"));
        assert_eq!(config.database_resolved.url, "sqlite:///srv/loris/loris.db");
        assert_eq!(config.media_resolved.dir, PathBuf::from("/srv/loris/media"));
        assert_eq!(config.s3.region, "ap-northeast-1");
        assert_eq!(config.s3.endpoint, None);
        assert_eq!(config.news.max_index_items, 6);
        assert_eq!(config.news.items_per_page, 5);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.news.items_per_page, 5);
        assert_eq!(config.s3.region, "ap-northeast-1");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
url = "sqlite://data/cms.db"

[media]
dir = "uploads"

[s3]
endpoint = "http://localhost:4566"
region = "us-east-1"

[news]
max_index_items = 3
items_per_page = 10
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.database_resolved.url, "sqlite:///project/data/cms.db");
        assert_eq!(config.media_resolved.dir, PathBuf::from("/project/uploads"));
        assert_eq!(config.s3.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.s3.region, "us-east-1");
        assert_eq!(config.news.max_index_items, 3);
        assert_eq!(config.news.items_per_page, 10);
    }

    #[test]
    fn test_resolve_keeps_absolute_and_memory_urls() {
        assert_eq!(
            resolve_sqlite_url("sqlite:///var/lib/loris.db", Path::new("/project")),
            "sqlite:///var/lib/loris.db"
        );
        assert_eq!(
            resolve_sqlite_url("sqlite::memory:", Path::new("/project")),
            "sqlite::memory:"
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            s3_endpoint: Some("http://minio:9000".to_owned()),
            news_items_per_page: Some(2),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.s3.endpoint.as_deref(), Some("http://minio:9000"));
        assert_eq!(config.news.items_per_page, 2);
        assert_eq!(config.news.max_index_items, 6); // Unchanged
        assert_eq!(config.s3.region, "ap-northeast-1"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty_endpoint_clears() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.s3.endpoint = Some("http://localhost:4566".to_owned());

        config.apply_cli_settings(&CliSettings {
            s3_endpoint: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(config.s3.endpoint, None);
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("LORIS_CFG_TEST_ENDPOINT", "http://localhost:4566");
            std::env::remove_var("LORIS_CFG_TEST_REGION");
        }

        let toml = r#"
[s3]
endpoint = "${LORIS_CFG_TEST_ENDPOINT}"
region = "${LORIS_CFG_TEST_REGION:-eu-west-1}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.s3.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.s3.region, "eu-west-1");

        unsafe {
            std::env::remove_var("LORIS_CFG_TEST_ENDPOINT");
        }
    }

    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(msg.contains(s), "Expected error to contain '{s}', got: {msg}");
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_items_per_page_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.news.items_per_page = 0;
        assert_validation_error(&config, &["news.items_per_page", "greater than 0"]);
    }

    #[test]
    fn test_validate_max_index_items_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.news.max_index_items = 0;
        assert_validation_error(&config, &["news.max_index_items"]);
    }

    #[test]
    fn test_validate_endpoint_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.s3.endpoint = Some("localhost:4566".to_owned());
        assert_validation_error(&config, &["s3.endpoint", "http"]);
    }

    #[test]
    fn test_validate_database_url_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.database_resolved.url = String::new();
        assert_validation_error(&config, &["database.url", "empty"]);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/loris.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
