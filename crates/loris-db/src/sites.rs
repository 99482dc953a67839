//! Static sites and their index and news pages.

use chrono::{DateTime, Utc};
use loris_model::{
    INDEX_FILENAME, IndexPage, ModelError, NewsPage, Page, PageType, StaticSite, SyncTarget,
};

use crate::rows::{self, AUDIT_COLUMNS, PAGE_COLUMNS};
use crate::{Database, DbError};

/// Fields of a site to create.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub organization_id: i64,
    pub name: String,
    pub staging_bucket: String,
    pub production_bucket: String,
}

/// Index page settings. The filename is always `index.html`.
#[derive(Debug, Clone, Default)]
pub struct IndexPageInput {
    pub relative_path: String,
    pub template: String,
    /// Template variable bound to the latest news items; `None` disables news.
    pub newsitems_variable: Option<String>,
}

/// News page settings. Empty fields fall back to `news.html` in `news/`.
#[derive(Debug, Clone, Default)]
pub struct NewsPageInput {
    pub filename: Option<String>,
    pub relative_path: Option<String>,
    pub template: String,
}

impl Database {
    pub async fn create_site(&self, site: NewSite, actor: i64) -> Result<StaticSite, DbError> {
        StaticSite::validate_fields(&site.name, &site.staging_bucket, &site.production_bucket)?;
        self.get_organization(site.organization_id).await?;
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO static_sites (organization_id, name, staging_bucket, production_bucket, \
             {AUDIT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        ))
        .bind(site.organization_id)
        .bind(&site.name)
        .bind(&site.staging_bucket)
        .bind(&site.production_bucket)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::on_conflict(e, || format!("site {}", site.name)))?;
        let site = rows::site(&row)?;
        tracing::info!(site_id = site.id, name = %site.name, "Created site");
        Ok(site)
    }

    pub async fn get_site(&self, id: i64) -> Result<StaticSite, DbError> {
        let row = sqlx::query("SELECT * FROM static_sites WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("site", id))?;
        Ok(rows::site(&row)?)
    }

    /// Sites ordered by name, optionally restricted to one organization.
    pub async fn list_sites(&self, organization_id: Option<i64>) -> Result<Vec<StaticSite>, DbError> {
        let rows = match organization_id {
            Some(id) => {
                sqlx::query("SELECT * FROM static_sites WHERE organization_id = ? ORDER BY name, id")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM static_sites ORDER BY name, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows::collect(&rows, rows::site)?)
    }

    /// Stamp the last successful sync to `target`.
    pub async fn record_sync(
        &self,
        site_id: i64,
        target: SyncTarget,
        at: DateTime<Utc>,
    ) -> Result<StaticSite, DbError> {
        let column = match target {
            SyncTarget::Staging => "last_staging_sync_at",
            SyncTarget::Production => "last_production_sync_at",
        };
        let row = sqlx::query(&format!(
            "UPDATE static_sites SET {column} = ? WHERE id = ? RETURNING *"
        ))
        .bind(at)
        .bind(site_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("site", site_id))?;
        Ok(rows::site(&row)?)
    }

    /// Create or replace the index page of a site.
    pub async fn set_index_page(
        &self,
        site_id: i64,
        input: IndexPageInput,
        actor: i64,
    ) -> Result<IndexPage, DbError> {
        self.get_site(site_id).await?;
        let relative_path = Page::normalize_location(INDEX_FILENAME, &input.relative_path)?;
        let variable = input
            .newsitems_variable
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        if let Some(name) = &variable {
            validate_identifier(name)?;
        }

        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO pages (site_id, page_type, filename, relative_path, template, \
             newsitems_variable, {AUDIT_COLUMNS}) VALUES (?, 'index', ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (site_id, page_type) DO UPDATE SET \
             relative_path = excluded.relative_path, template = excluded.template, \
             newsitems_variable = excluded.newsitems_variable, \
             updated_by = excluded.updated_by, updated_at = excluded.updated_at \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(site_id)
        .bind(INDEX_FILENAME)
        .bind(&relative_path)
        .bind(&input.template)
        .bind(&variable)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(rows::index_page(&row)?)
    }

    /// Create or replace the news page of a site. The site needs an index page.
    pub async fn set_news_page(
        &self,
        site_id: i64,
        input: NewsPageInput,
        actor: i64,
    ) -> Result<NewsPage, DbError> {
        let index = self
            .get_index_page(site_id)
            .await?
            .ok_or_else(|| DbError::not_found("index page", site_id))?;
        let filename = input
            .filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| NewsPage::DEFAULT_FILENAME.to_owned());
        let relative_path = input
            .relative_path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| NewsPage::DEFAULT_RELATIVE_PATH.to_owned());
        let relative_path = Page::normalize_location(&filename, &relative_path)?;

        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO pages (site_id, page_type, filename, relative_path, template, \
             index_page_id, {AUDIT_COLUMNS}) VALUES (?, 'news', ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (site_id, page_type) DO UPDATE SET \
             filename = excluded.filename, relative_path = excluded.relative_path, \
             template = excluded.template, index_page_id = excluded.index_page_id, \
             updated_by = excluded.updated_by, updated_at = excluded.updated_at \
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(site_id)
        .bind(&filename)
        .bind(&relative_path)
        .bind(&input.template)
        .bind(index.page.id)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(rows::news_page(&row)?)
    }

    pub async fn get_index_page(&self, site_id: i64) -> Result<Option<IndexPage>, DbError> {
        let row = self.fetch_page_row(site_id, PageType::Index).await?;
        Ok(row.as_ref().map(rows::index_page).transpose()?)
    }

    pub async fn get_news_page(&self, site_id: i64) -> Result<Option<NewsPage>, DbError> {
        let row = self.fetch_page_row(site_id, PageType::News).await?;
        Ok(row.as_ref().map(rows::news_page).transpose()?)
    }

    /// The page of `page_type` on a site, as common page fields.
    pub async fn get_page(&self, site_id: i64, page_type: PageType) -> Result<Page, DbError> {
        let row = self
            .fetch_page_row(site_id, page_type)
            .await?
            .ok_or_else(|| DbError::not_found("page", format!("{page_type} page of site {site_id}")))?;
        Ok(rows::page(&row)?)
    }

    async fn fetch_page_row(
        &self,
        site_id: i64,
        page_type: PageType,
    ) -> Result<Option<sqlx::sqlite::SqliteRow>, DbError> {
        Ok(sqlx::query(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE site_id = ? AND page_type = ?"
        ))
        .bind(site_id)
        .bind(page_type.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }
}

/// Template variables must be plain identifiers.
fn validate_identifier(name: &str) -> Result<(), ModelError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && name.len() <= 255 {
        Ok(())
    } else {
        Err(ModelError::Invalid {
            field: "page.newsitems_variable",
            message: format!("not a template identifier: {name}"),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{Fixture, fixture};

    pub(crate) async fn create_site(fx: &Fixture) -> StaticSite {
        fx.db
            .create_site(
                NewSite {
                    organization_id: fx.org.id,
                    name: "Main".to_owned(),
                    staging_bucket: "main-staging".to_owned(),
                    production_bucket: "main-production".to_owned(),
                },
                fx.admin.id,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_sites() {
        let fx = fixture().await;
        let site = create_site(&fx).await;

        assert_eq!(site.organization_id, fx.org.id);
        assert_eq!(site.last_staging_sync, None);
        assert_eq!(fx.db.list_sites(Some(fx.org.id)).await.unwrap(), vec![site.clone()]);
        assert_eq!(fx.db.list_sites(Some(fx.org.id + 100)).await.unwrap(), vec![]);
        assert_eq!(fx.db.get_site(site.id).await.unwrap(), site);
    }

    #[tokio::test]
    async fn test_site_name_unique_per_organization() {
        let fx = fixture().await;
        create_site(&fx).await;

        let err = fx
            .db
            .create_site(
                NewSite {
                    organization_id: fx.org.id,
                    name: "Main".to_owned(),
                    staging_bucket: "other-staging".to_owned(),
                    production_bucket: "other-production".to_owned(),
                },
                fx.admin.id,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_bucket_rejected() {
        let fx = fixture().await;

        let err = fx
            .db
            .create_site(
                NewSite {
                    organization_id: fx.org.id,
                    name: "Main".to_owned(),
                    staging_bucket: "Bad_Bucket".to_owned(),
                    production_bucket: "main-production".to_owned(),
                },
                fx.admin.id,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_record_sync() {
        let fx = fixture().await;
        let site = create_site(&fx).await;
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let site = fx
            .db
            .record_sync(site.id, SyncTarget::Production, at)
            .await
            .unwrap();

        assert_eq!(site.last_production_sync, Some(at));
        assert_eq!(site.last_staging_sync, None);
    }

    #[tokio::test]
    async fn test_index_page_upsert() {
        let fx = fixture().await;
        let site = create_site(&fx).await;

        let first = fx
            .db
            .set_index_page(
                site.id,
                IndexPageInput {
                    relative_path: "./".to_owned(),
                    template: "<html></html>".to_owned(),
                    newsitems_variable: Some("latest_news".to_owned()),
                },
                fx.admin.id,
            )
            .await
            .unwrap();
        let second = fx
            .db
            .set_index_page(
                site.id,
                IndexPageInput {
                    template: "<html>v2</html>".to_owned(),
                    ..IndexPageInput::default()
                },
                fx.admin.id,
            )
            .await
            .unwrap();

        assert_eq!(first.page.id, second.page.id);
        assert_eq!(first.page.relative_path, "");
        assert_eq!(first.page.filename, "index.html");
        assert!(first.has_news());
        assert!(!second.has_news());
        assert_eq!(second.page.template, "<html>v2</html>");
    }

    #[tokio::test]
    async fn test_index_page_rejects_bad_variable() {
        let fx = fixture().await;
        let site = create_site(&fx).await;

        let err = fx
            .db
            .set_index_page(
                site.id,
                IndexPageInput {
                    newsitems_variable: Some("latest news".to_owned()),
                    ..IndexPageInput::default()
                },
                fx.admin.id,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_news_page_requires_index() {
        let fx = fixture().await;
        let site = create_site(&fx).await;

        let err = fx
            .db
            .set_news_page(site.id, NewsPageInput::default(), fx.admin.id)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { entity: "index page", .. }));
    }

    #[tokio::test]
    async fn test_news_page_defaults() {
        let fx = fixture().await;
        let site = create_site(&fx).await;
        let index = fx
            .db
            .set_index_page(site.id, IndexPageInput::default(), fx.admin.id)
            .await
            .unwrap();

        let news = fx
            .db
            .set_news_page(site.id, NewsPageInput::default(), fx.admin.id)
            .await
            .unwrap();

        assert_eq!(news.index_page_id, index.page.id);
        assert_eq!(news.page.filename, "news.html");
        assert_eq!(news.page.relative_path, "news");
        assert_eq!(fx.db.get_news_page(site.id).await.unwrap(), Some(news.clone()));
        assert_eq!(fx.db.get_page(site.id, PageType::News).await.unwrap(), news.page);
    }

    #[tokio::test]
    async fn test_page_path_cannot_escape_site() {
        let fx = fixture().await;
        let site = create_site(&fx).await;

        let err = fx
            .db
            .set_index_page(
                site.id,
                IndexPageInput {
                    relative_path: "../outside".to_owned(),
                    ..IndexPageInput::default()
                },
                fx.admin.id,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Invalid(ModelError::PathEscapesRoot(_))));
    }
}
