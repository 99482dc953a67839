//! SQLite persistence for Loris.
//!
//! [`Database`] wraps a `sqlx` connection pool and exposes one method per
//! repository operation, grouped by record type:
//!
//! - organizations, email domains and users (`accounts`)
//! - static sites and their pages (`sites`)
//! - page assets (`assets`)
//! - news items (`news`)
//! - [`Database::load_site_snapshot`], which gathers everything the
//!   instantiation pipeline needs for one site
//!
//! Every write that creates or touches an audited record takes the acting
//! user's id.

mod accounts;
mod assets;
mod error;
mod migrations;
mod news;
mod rows;
mod sites;
mod snapshot;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use accounts::UserCreateOptions;
pub use assets::NewAsset;
pub use error::DbError;
pub use news::NewNewsItem;
pub use sites::{IndexPageInput, NewSite, NewsPageInput};

/// Handle to the CMS database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (and create if missing) the database at `url`.
    ///
    /// In-memory databases are limited to a single connection so every query
    /// sees the same data.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        tracing::debug!(url, "Connected to database");
        Ok(Self { pool })
    }

    /// Apply pending schema migrations. Returns how many were applied.
    pub async fn migrate(&self) -> Result<usize, DbError> {
        migrations::run_migrations(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
