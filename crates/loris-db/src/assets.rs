//! Page assets.

use chrono::Utc;
use loris_model::{FileType, PageAsset};

use crate::rows::{self, AUDIT_COLUMNS};
use crate::{Database, DbError};

/// An uploaded file to register on a page.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub page_id: i64,
    pub file_type: FileType,
    pub filename: String,
    pub relative_path: String,
    /// Media storage key of the already uploaded content.
    pub content_key: String,
}

impl Database {
    pub async fn add_asset(&self, asset: NewAsset, actor: i64) -> Result<PageAsset, DbError> {
        let relative_path = PageAsset::normalize_location(&asset.filename, &asset.relative_path)?;

        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO page_assets (page_id, file_type, filename, relative_path, content_key, \
             {AUDIT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        ))
        .bind(asset.page_id)
        .bind(asset.file_type.as_str())
        .bind(&asset.filename)
        .bind(&relative_path)
        .bind(&asset.content_key)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                DbError::not_found("page", asset.page_id)
            }
            e => DbError::on_conflict(e, || {
                format!("asset {relative_path}/{}", asset.filename)
            }),
        })?;
        let asset = rows::asset(&row)?;
        tracing::debug!(asset = %asset.relative_filepath(), page_id = asset.page_id, "Registered asset");
        Ok(asset)
    }

    /// Assets registered on any page of a site.
    pub async fn list_assets_for_site(&self, site_id: i64) -> Result<Vec<PageAsset>, DbError> {
        let rows = sqlx::query(
            "SELECT a.* FROM page_assets a JOIN pages p ON p.id = a.page_id \
             WHERE p.site_id = ? ORDER BY a.relative_path, a.filename",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows::collect(&rows, rows::asset)?)
    }

    pub async fn list_assets_for_page(&self, page_id: i64) -> Result<Vec<PageAsset>, DbError> {
        let rows = sqlx::query(
            "SELECT * FROM page_assets WHERE page_id = ? ORDER BY relative_path, filename",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows::collect(&rows, rows::asset)?)
    }
}
