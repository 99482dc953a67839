//! News items.

use chrono::{DateTime, Utc};
use loris_model::{
    DEFAULT_IMAGE_RELPATH, NewsImage, NewsItem, normalize_relpath, validate_filename,
};

use crate::rows::{self, AUDIT_COLUMNS};
use crate::{Database, DbError};

/// A news item to create on a news page.
#[derive(Debug, Clone)]
pub struct NewNewsItem {
    pub news_page_id: i64,
    pub title: String,
    pub text: String,
    pub publish_on: DateTime<Utc>,
    pub is_published: bool,
    pub image: Option<NewsImage>,
    /// Site directory for the image; defaults to `imgs/news`.
    pub image_relpath: Option<String>,
}

impl Database {
    pub async fn create_news_item(
        &self,
        item: NewNewsItem,
        actor: i64,
    ) -> Result<NewsItem, DbError> {
        NewsItem::validate_fields(&item.title, &item.text)?;
        if let Some(image) = &item.image {
            validate_filename("news_item.image", &image.filename)?;
        }
        let image_relpath = normalize_relpath(
            item.image_relpath
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_IMAGE_RELPATH),
        )?;
        let news_page = sqlx::query("SELECT id FROM pages WHERE id = ? AND page_type = 'news'")
            .bind(item.news_page_id)
            .fetch_optional(&self.pool)
            .await?;
        if news_page.is_none() {
            return Err(DbError::not_found("news page", item.news_page_id));
        }

        let (image_filename, image_key) = match &item.image {
            Some(image) => (Some(image.filename.as_str()), Some(image.content_key.as_str())),
            None => (None, None),
        };
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO news_items (news_page_id, title, text, publish_on, is_published, \
             image_filename, image_key, image_relpath, {AUDIT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        ))
        .bind(item.news_page_id)
        .bind(&item.title)
        .bind(&item.text)
        .bind(item.publish_on)
        .bind(item.is_published)
        .bind(image_filename)
        .bind(image_key)
        .bind(&image_relpath)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(rows::news_item(&row)?)
    }

    pub async fn set_published(
        &self,
        id: i64,
        is_published: bool,
        actor: i64,
    ) -> Result<NewsItem, DbError> {
        let row = sqlx::query(
            "UPDATE news_items SET is_published = ?, updated_by = ?, updated_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(is_published)
        .bind(actor)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("news item", id))?;
        Ok(rows::news_item(&row)?)
    }

    /// Every item of a news page, newest first, published or not.
    pub async fn list_news_items(&self, news_page_id: i64) -> Result<Vec<NewsItem>, DbError> {
        let rows = sqlx::query(
            "SELECT * FROM news_items WHERE news_page_id = ? ORDER BY publish_on DESC, id DESC",
        )
        .bind(news_page_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows::collect(&rows, rows::news_item)?)
    }
}
