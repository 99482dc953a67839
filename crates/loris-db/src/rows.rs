//! Row → record mapping.

use chrono::{DateTime, Utc};
use loris_model::{
    Audit, IndexPage, NewsImage, NewsItem, NewsPage, Organization, OrganizationEmailDomain,
    OrganizationUser, Page, PageAsset, StaticSite,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Column list shared by every audited table.
pub(crate) const AUDIT_COLUMNS: &str = "created_by, updated_by, created_at, updated_at";

/// Columns selected for pages, matching [`page`].
pub(crate) const PAGE_COLUMNS: &str = "id, site_id, page_type, filename, relative_path, template, \
     newsitems_variable, index_page_id, created_by, updated_by, created_at, updated_at";

fn decode_err(column: &str, err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: Box::new(err),
    }
}

pub(crate) fn audit(row: &SqliteRow) -> Result<Audit, sqlx::Error> {
    Ok(Audit {
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn organization(row: &SqliteRow) -> Result<Organization, sqlx::Error> {
    Ok(Organization {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        is_active: row.try_get("is_active")?,
        audit: audit(row)?,
    })
}

pub(crate) fn email_domain(row: &SqliteRow) -> Result<OrganizationEmailDomain, sqlx::Error> {
    Ok(OrganizationEmailDomain {
        id: row.try_get("id")?,
        organization_id: row.try_get("organization_id")?,
        domain: row.try_get("domain")?,
        audit: audit(row)?,
    })
}

pub(crate) fn user(row: &SqliteRow) -> Result<OrganizationUser, sqlx::Error> {
    Ok(OrganizationUser {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        is_superuser: row.try_get("is_superuser")?,
        is_staff: row.try_get("is_staff")?,
        organization_id: row.try_get("organization_id")?,
        date_joined: row.try_get("date_joined")?,
    })
}

pub(crate) fn site(row: &SqliteRow) -> Result<StaticSite, sqlx::Error> {
    Ok(StaticSite {
        id: row.try_get("id")?,
        organization_id: row.try_get("organization_id")?,
        name: row.try_get("name")?,
        staging_bucket: row.try_get("staging_bucket")?,
        production_bucket: row.try_get("production_bucket")?,
        last_staging_sync: row.try_get("last_staging_sync_at")?,
        last_production_sync: row.try_get("last_production_sync_at")?,
        audit: audit(row)?,
    })
}

pub(crate) fn page(row: &SqliteRow) -> Result<Page, sqlx::Error> {
    let page_type: String = row.try_get("page_type")?;
    Ok(Page {
        id: row.try_get("id")?,
        site_id: row.try_get("site_id")?,
        page_type: page_type
            .parse()
            .map_err(|e| decode_err("page_type", e))?,
        filename: row.try_get("filename")?,
        relative_path: row.try_get("relative_path")?,
        template: row.try_get("template")?,
        audit: audit(row)?,
    })
}

pub(crate) fn index_page(row: &SqliteRow) -> Result<IndexPage, sqlx::Error> {
    Ok(IndexPage {
        page: page(row)?,
        newsitems_variable: row.try_get("newsitems_variable")?,
    })
}

pub(crate) fn news_page(row: &SqliteRow) -> Result<NewsPage, sqlx::Error> {
    let index_page_id: Option<i64> = row.try_get("index_page_id")?;
    Ok(NewsPage {
        page: page(row)?,
        index_page_id: index_page_id.ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "index_page_id".to_owned(),
            source: "news page without index page".into(),
        })?,
    })
}

pub(crate) fn asset(row: &SqliteRow) -> Result<PageAsset, sqlx::Error> {
    let file_type: String = row.try_get("file_type")?;
    Ok(PageAsset {
        id: row.try_get("id")?,
        page_id: row.try_get("page_id")?,
        file_type: file_type
            .parse()
            .map_err(|e| decode_err("file_type", e))?,
        filename: row.try_get("filename")?,
        relative_path: row.try_get("relative_path")?,
        content_key: row.try_get("content_key")?,
        audit: audit(row)?,
    })
}

pub(crate) fn news_item(row: &SqliteRow) -> Result<NewsItem, sqlx::Error> {
    let image_filename: Option<String> = row.try_get("image_filename")?;
    let image_key: Option<String> = row.try_get("image_key")?;
    let image = match (image_filename, image_key) {
        (Some(filename), Some(content_key)) => Some(NewsImage {
            filename,
            content_key,
        }),
        _ => None,
    };
    Ok(NewsItem {
        id: row.try_get("id")?,
        news_page_id: row.try_get("news_page_id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        publish_on: row.try_get("publish_on")?,
        is_published: row.try_get("is_published")?,
        image,
        image_relpath: row.try_get("image_relpath")?,
        audit: audit(row)?,
    })
}

/// Map every row with `f`, stopping at the first decode error.
pub(crate) fn collect<T>(
    rows: &[SqliteRow],
    f: impl Fn(&SqliteRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, sqlx::Error> {
    rows.iter().map(f).collect()
}
