//! Static site instantiation for Loris.
//!
//! Turns a [`SiteSnapshot`] into a directory of files ready to sync to a
//! bucket. For each page (the index page first, then the news page when the
//! index shows news):
//!
//! 1. the template's `link`, `script` and `img` references are checked
//!    against the assets registered on the pages being written
//!    ([`check_expected_assets`]);
//! 2. the page's assets are copied from media storage ([`prepare_assets`]);
//! 3. the template is rendered with minijinja ([`instantiate_index`],
//!    [`instantiate_news`]).
//!
//! Nothing is rendered for a page whose template references an unregistered
//! file, and nothing at all when two pages register an asset at the same
//! path ([`check_asset_paths`]).

mod assets;
mod error;
mod index;
mod news;
mod render;

use std::path::{Path, PathBuf};

use loris_media::MediaStorage;
use loris_model::{PageType, SiteSnapshot};

pub use assets::{check_asset_paths, check_expected_assets, prepare_assets, template_relpaths};
pub use error::SiteError;
pub use index::instantiate_index;
pub use news::{NewsOutput, instantiate_news};

/// News limits applied while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantiateSettings {
    /// Latest items bound on the index page.
    pub max_index_news_items: usize,
    pub news_items_per_page: usize,
}

impl Default for InstantiateSettings {
    fn default() -> Self {
        Self {
            max_index_news_items: 6,
            news_items_per_page: 5,
        }
    }
}

/// A file written into the site tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub absolute_path: PathBuf,
    /// `/`-separated path inside the site.
    pub relative_path: String,
}

/// Files written for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiatedPage {
    pub page_type: PageType,
    pub html_files: Vec<RenderedFile>,
    pub asset_files: Vec<RenderedFile>,
}

/// Instantiate every page of a site into `root`.
pub fn instantiate_site(
    snapshot: &SiteSnapshot,
    media: &dyn MediaStorage,
    root: &Path,
    settings: &InstantiateSettings,
) -> Result<Vec<InstantiatedPage>, SiteError> {
    tracing::info!(site = %snapshot.site.name, root = %root.display(), "Instantiating site");
    check_asset_paths(snapshot)?;
    let mut pages = Vec::with_capacity(2);

    let index = &snapshot.index.page;
    let asset_files = prepare_assets(index, snapshot, media, root)?;
    let html = instantiate_index(snapshot, root, settings)?;
    pages.push(InstantiatedPage {
        page_type: PageType::Index,
        html_files: vec![html],
        asset_files,
    });

    if snapshot.index.has_news() {
        let section = snapshot
            .news
            .as_ref()
            .ok_or_else(|| SiteError::NewsPageMissing {
                site: snapshot.site.name.clone(),
            })?;
        let mut asset_files = prepare_assets(&section.page.page, snapshot, media, root)?;
        let output = instantiate_news(
            &snapshot.site.name,
            section,
            media,
            root,
            settings.news_items_per_page,
        )?;
        asset_files.extend(output.images);
        pages.push(InstantiatedPage {
            page_type: PageType::News,
            html_files: output.pages,
            asset_files,
        });
    }

    let files: usize = pages
        .iter()
        .map(|p| p.html_files.len() + p.asset_files.len())
        .sum();
    tracing::info!(site = %snapshot.site.name, files, "Site instantiated");
    Ok(pages)
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{Duration, TimeZone, Utc};
    use loris_model::{
        Audit, FileType, IndexPage, NewsItem, NewsSection, Page, PageAsset, PageType,
        SiteSnapshot, StaticSite,
    };

    fn audit() -> Audit {
        Audit::created_now(1)
    }

    pub(crate) fn page(id: i64, page_type: PageType, relative_path: &str, template: &str) -> Page {
        let filename = match page_type {
            PageType::Index => "index.html",
            PageType::News => "news.html",
        };
        Page {
            id,
            site_id: 1,
            page_type,
            filename: filename.to_owned(),
            relative_path: relative_path.to_owned(),
            template: template.to_owned(),
            audit: audit(),
        }
    }

    pub(crate) fn asset(
        id: i64,
        page_id: i64,
        file_type: FileType,
        relative_path: &str,
        filename: &str,
        content_key: &str,
    ) -> PageAsset {
        PageAsset {
            id,
            page_id,
            file_type,
            filename: filename.to_owned(),
            relative_path: relative_path.to_owned(),
            content_key: content_key.to_owned(),
            audit: audit(),
        }
    }

    /// Published on 2024-01-01 plus `day` days.
    pub(crate) fn news_item(id: i64, day: i64, is_published: bool) -> NewsItem {
        NewsItem {
            id,
            news_page_id: 2,
            title: format!("item {id}"),
            text: "Ten or more characters".to_owned(),
            publish_on: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            is_published,
            image: None,
            image_relpath: "imgs/news".to_owned(),
            audit: audit(),
        }
    }

    pub(crate) fn snapshot(
        index: Page,
        news: Option<NewsSection>,
        assets: Vec<PageAsset>,
    ) -> SiteSnapshot {
        let newsitems_variable = news.as_ref().map(|_| "latest_news".to_owned());
        SiteSnapshot {
            site: StaticSite {
                id: 1,
                organization_id: 7,
                name: "Example".to_owned(),
                staging_bucket: "example-staging".to_owned(),
                production_bucket: "example-production".to_owned(),
                last_staging_sync: None,
                last_production_sync: None,
                audit: audit(),
            },
            index: IndexPage {
                page: index,
                newsitems_variable,
            },
            news,
            assets,
        }
    }
}
