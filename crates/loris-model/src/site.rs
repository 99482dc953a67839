//! Static sites, their pages and page assets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::news::NewsItem;
use crate::{
    Audit, ModelError, join_relpath, normalize_relpath, validate_bucket_name, validate_filename,
    validate_length,
};

/// Filename every index page is written to.
pub const INDEX_FILENAME: &str = "index.html";

/// A static site owned by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticSite {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub staging_bucket: String,
    pub production_bucket: String,
    pub last_staging_sync: Option<DateTime<Utc>>,
    pub last_production_sync: Option<DateTime<Utc>>,
    pub audit: Audit,
}

impl StaticSite {
    pub fn validate_fields(
        name: &str,
        staging_bucket: &str,
        production_bucket: &str,
    ) -> Result<(), ModelError> {
        validate_length("site.name", name, 1, 150)?;
        validate_bucket_name("site.staging_bucket", staging_bucket)?;
        validate_bucket_name("site.production_bucket", production_bucket)?;
        Ok(())
    }

    /// Bucket a sync to `target` writes to.
    pub fn bucket_for(&self, target: SyncTarget) -> &str {
        match target {
            SyncTarget::Staging => &self.staging_bucket,
            SyncTarget::Production => &self.production_bucket,
        }
    }

    pub fn last_sync(&self, target: SyncTarget) -> Option<DateTime<Utc>> {
        match target {
            SyncTarget::Staging => self.last_staging_sync,
            SyncTarget::Production => self.last_production_sync,
        }
    }
}

/// Which of a site's two buckets a sync updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Staging,
    Production,
}

impl SyncTarget {
    pub fn from_production_flag(update_production: bool) -> Self {
        if update_production {
            Self::Production
        } else {
            Self::Staging
        }
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging => f.write_str("staging"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Kind of page; a site has at most one page of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Index,
    News,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::News => "news",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(Self::Index),
            "news" => Ok(Self::News),
            other => Err(ModelError::UnknownChoice {
                kind: "page type",
                value: other.to_owned(),
            }),
        }
    }
}

/// Fields common to every page of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    pub page_type: PageType,
    pub filename: String,
    /// Normalized directory the page is written to (`""` for the site root).
    pub relative_path: String,
    /// Page template source (Jinja syntax).
    pub template: String,
    pub audit: Audit,
}

impl Page {
    pub fn relative_filepath(&self) -> String {
        join_relpath(&self.relative_path, &self.filename)
    }

    /// Validate and normalize the user-supplied location of a page.
    pub fn normalize_location(filename: &str, relative_path: &str) -> Result<String, ModelError> {
        validate_filename("page.filename", filename)?;
        validate_length("page.relative_path", relative_path, 0, 250)?;
        normalize_relpath(relative_path)
    }
}

/// The root page of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexPage {
    pub page: Page,
    /// Template variable the latest news items are bound to.
    pub newsitems_variable: Option<String>,
}

impl IndexPage {
    pub fn has_news(&self) -> bool {
        self.newsitems_variable
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

/// The paginated news section of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsPage {
    pub page: Page,
    pub index_page_id: i64,
}

impl NewsPage {
    pub const DEFAULT_FILENAME: &'static str = "news.html";
    pub const DEFAULT_RELATIVE_PATH: &'static str = "news";

    /// Filename of the `n`-th generated page: `news.html` → `news_0.html`.
    pub fn page_filename(&self, n: usize) -> String {
        let (stem, ext) = match self.page.filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (self.page.filename.as_str(), None),
        };
        match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        }
    }
}

/// Kind of file an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Css,
    Js,
    Img,
    Pdf,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Img => "img",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "css" => Ok(Self::Css),
            "js" | "javascript" => Ok(Self::Js),
            "img" | "image" => Ok(Self::Img),
            "pdf" => Ok(Self::Pdf),
            other => Err(ModelError::UnknownChoice {
                kind: "file type",
                value: other.to_owned(),
            }),
        }
    }
}

/// An uploaded file published next to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageAsset {
    pub id: i64,
    pub page_id: i64,
    pub file_type: FileType,
    pub filename: String,
    /// Normalized directory inside the site.
    pub relative_path: String,
    /// Key of the uploaded content in media storage.
    pub content_key: String,
    pub audit: Audit,
}

impl PageAsset {
    pub fn relative_filepath(&self) -> String {
        join_relpath(&self.relative_path, &self.filename)
    }

    /// Validate a filename and directory, returning the normalized directory.
    pub fn normalize_location(filename: &str, relative_path: &str) -> Result<String, ModelError> {
        validate_filename("asset.filename", filename)?;
        validate_length("asset.relative_path", relative_path, 0, 250)?;
        normalize_relpath(relative_path)
    }

    /// [`relative_filepath`](Self::relative_filepath), after checking the
    /// stored location still stays inside the site.
    pub fn checked_filepath(&self) -> Result<String, ModelError> {
        let relative_path = Self::normalize_location(&self.filename, &self.relative_path)?;
        Ok(join_relpath(&relative_path, &self.filename))
    }
}

/// A news page together with all of its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSection {
    pub page: NewsPage,
    pub items: Vec<NewsItem>,
}

/// Everything needed to instantiate one site, loaded in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSnapshot {
    pub site: StaticSite,
    pub index: IndexPage,
    pub news: Option<NewsSection>,
    /// Assets registered on any page of the site.
    pub assets: Vec<PageAsset>,
}

impl SiteSnapshot {
    pub fn organization_id(&self) -> i64 {
        self.site.organization_id
    }

    /// Assets registered on one page.
    pub fn assets_for(&self, page_id: i64) -> impl Iterator<Item = &PageAsset> {
        self.assets.iter().filter(move |a| a.page_id == page_id)
    }

    /// Pages an instantiation writes: the index page, then the news page
    /// when the index shows news.
    pub fn published_pages(&self) -> Vec<&Page> {
        let mut pages = vec![&self.index.page];
        if self.index.has_news()
            && let Some(news) = &self.news
        {
            pages.push(&news.page.page);
        }
        pages
    }

    /// Assets registered on the pages in [`published_pages`](Self::published_pages).
    pub fn published_assets(&self) -> impl Iterator<Item = &PageAsset> {
        let page_ids: Vec<i64> = self.published_pages().iter().map(|p| p.id).collect();
        self.assets
            .iter()
            .filter(move |a| page_ids.contains(&a.page_id))
    }

    /// Site-relative paths of the assets an instantiation writes.
    pub fn registered_relpaths(&self) -> BTreeSet<String> {
        self.published_assets()
            .map(PageAsset::relative_filepath)
            .collect()
    }
}
