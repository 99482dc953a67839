//! Template asset extraction, validation and copying.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use loris_media::MediaStorage;
use loris_model::{Page, SiteSnapshot, normalize_relpath, resolve_reference};
use scraper::{Html, Selector};

use crate::{RenderedFile, SiteError};

/// Elements whose attribute points at a file the page needs.
const ASSET_SELECTORS: &[(&str, &str)] = &[
    ("link[href]", "href"),
    ("script[src]", "src"),
    ("img[src]", "src"),
];

/// Whether a reference points outside the generated site.
fn is_external(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("//")
        || lower.starts_with("data:")
}

/// Site-relative paths of the local files a page template references.
///
/// External URLs, values built from template expressions and bare
/// fragments are ignored.
pub fn template_relpaths(page: &Page) -> Result<BTreeSet<String>, SiteError> {
    let document = Html::parse_document(&page.template);
    let mut relpaths = BTreeSet::new();

    for (selector, attr) in ASSET_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attr) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty()
                || value.starts_with(['#', '?'])
                || value.contains("{{")
                || value.contains("{%")
                || is_external(value)
            {
                continue;
            }
            let relpath = resolve_reference(&page.relative_path, value).map_err(|source| {
                SiteError::InvalidReference {
                    page: page.relative_filepath(),
                    source,
                }
            })?;
            if !relpath.is_empty() {
                relpaths.insert(relpath);
            }
        }
    }

    Ok(relpaths)
}

/// Check that every file the template references is registered.
///
/// Returns the referenced paths on success.
pub fn check_expected_assets(
    page: &Page,
    registered: &BTreeSet<String>,
) -> Result<BTreeSet<String>, SiteError> {
    let expected = template_relpaths(page)?;
    let missing: Vec<String> = expected.difference(registered).cloned().collect();
    if !missing.is_empty() {
        return Err(SiteError::MissingAssets {
            page: page.relative_filepath(),
            missing,
        });
    }
    Ok(expected)
}

/// Check that no two published pages write an asset to the same path.
pub fn check_asset_paths(snapshot: &SiteSnapshot) -> Result<(), SiteError> {
    let mut seen = BTreeMap::new();
    for asset in snapshot.published_assets() {
        let path = asset.relative_filepath();
        if let Some(page_id) = seen.insert(path.clone(), asset.page_id)
            && page_id != asset.page_id
        {
            return Err(SiteError::DuplicateAsset { path });
        }
    }
    Ok(())
}

/// Check the page's template, then copy the assets registered on the page
/// from media storage into `root`.
pub fn prepare_assets(
    page: &Page,
    snapshot: &SiteSnapshot,
    media: &dyn MediaStorage,
    root: &Path,
) -> Result<Vec<RenderedFile>, SiteError> {
    check_expected_assets(page, &snapshot.registered_relpaths())?;

    let mut written = Vec::new();
    for asset in snapshot.assets_for(page.id) {
        let relative_path = asset
            .checked_filepath()
            .map_err(|source| SiteError::InvalidAsset {
                path: asset.relative_filepath(),
                source,
            })?;
        tracing::info!(asset = %relative_path, root = %root.display(), "Writing page asset");
        let content = media.read(&asset.content_key)?;
        written.push(write_file(root, relative_path, &content)?);
    }
    Ok(written)
}

/// Write `content` at `root/relative_path`, creating parent directories.
///
/// Paths that climb out of `root` are rejected.
pub(crate) fn write_file(
    root: &Path,
    relative_path: String,
    content: &[u8],
) -> Result<RenderedFile, SiteError> {
    if let Err(source) = normalize_relpath(&relative_path) {
        return Err(SiteError::InvalidAsset {
            path: relative_path,
            source,
        });
    }
    let absolute_path = root.join(&relative_path);
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(|e| SiteError::io(parent, e))?;
    }
    fs::write(&absolute_path, content).map_err(|e| SiteError::io(&absolute_path, e))?;
    Ok(RenderedFile {
        absolute_path,
        relative_path,
    })
}

#[cfg(test)]
mod tests {
    use loris_media::MockMediaStorage;
    use loris_model::{FileType, PageAsset, PageType};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{asset, page, snapshot};

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| (*p).to_owned()).collect()
    }

    #[test]
    fn test_collects_link_script_and_img() {
        let page = page(
            1,
            PageType::Index,
            "",
            r#"<html><head>
                <link rel="stylesheet" href="css/style.css">
                <script src="./js/app.js?v=3"></script>
            </head><body>
                <img src="imgs/logo.png#top">
                <a href="about.html">About</a>
            </body></html>"#,
        );

        let paths = template_relpaths(&page).unwrap();

        assert_eq!(paths, set(&["css/style.css", "imgs/logo.png", "js/app.js"]));
    }

    #[test]
    fn test_skips_external_and_templated_references() {
        let page = page(
            1,
            PageType::Index,
            "",
            r#"<link href="https://cdn.example.com/x.css">
               <link href="HTTP://cdn.example.com/y.css">
               <script src="//cdn.example.com/z.js"></script>
               <img src="data:image/png;base64,AAAA">
               <img src="{{ item.image }}">
               <img src="">"#,
        );

        assert!(template_relpaths(&page).unwrap().is_empty());
    }

    #[test]
    fn test_resolves_against_page_directory() {
        let page = page(
            2,
            PageType::News,
            "news",
            r#"<link href="../css/style.css"><img src="/imgs/a.png"><img src="b.png">"#,
        );

        let paths = template_relpaths(&page).unwrap();

        assert_eq!(paths, set(&["css/style.css", "imgs/a.png", "news/b.png"]));
    }

    #[test]
    fn test_reference_escaping_root_is_error() {
        let page = page(1, PageType::Index, "", r#"<img src="../secret.png">"#);
        let err = template_relpaths(&page).unwrap_err();
        assert!(matches!(err, SiteError::InvalidReference { .. }));
    }

    #[test]
    fn test_missing_assets_are_reported_sorted() {
        let page = page(
            1,
            PageType::Index,
            "",
            r#"<script src="js/b.js"></script><link href="css/a.css"><img src="ok.png">"#,
        );

        let err = check_expected_assets(&page, &set(&["ok.png"])).unwrap_err();

        match err {
            SiteError::MissingAssets { page, missing } => {
                assert_eq!(page, "index.html");
                assert_eq!(missing, vec!["css/a.css".to_owned(), "js/b.js".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prepare_assets_copies_page_assets() {
        let dir = tempfile::tempdir().unwrap();
        let index = page(1, PageType::Index, "", r#"<link href="css/style.css">"#);
        let assets: Vec<PageAsset> = vec![
            asset(10, 1, FileType::Css, "css", "style.css", "assets/a/style.css"),
            asset(11, 2, FileType::Img, "imgs", "other.png", "assets/b/other.png"),
        ];
        let snapshot = snapshot(index.clone(), None, assets);
        let media = MockMediaStorage::new()
            .with_file("assets/a/style.css", "body {}")
            .with_file("assets/b/other.png", "png");

        let written = prepare_assets(&index, &snapshot, &media, dir.path()).unwrap();

        assert_eq!(written.len(), 1);
        assert_eq!(written[0].relative_path, "css/style.css");
        assert_eq!(
            fs::read_to_string(dir.path().join("css/style.css")).unwrap(),
            "body {}"
        );
        assert!(!dir.path().join("imgs/other.png").exists());
    }

    #[test]
    fn test_prepare_assets_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let index = page(1, PageType::Index, "", r#"<img src="missing.png">"#);
        let snapshot = snapshot(index.clone(), None, Vec::new());
        let media = MockMediaStorage::new();

        let err = prepare_assets(&index, &snapshot, &media, dir.path()).unwrap_err();

        assert!(matches!(err, SiteError::MissingAssets { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_asset_outside_site_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        let index = page(1, PageType::Index, "", "<p>plain</p>");
        let snapshot = snapshot(
            index.clone(),
            None,
            vec![asset(10, 1, FileType::Css, "", "../escaped.css", "assets/a/escaped.css")],
        );
        let media = MockMediaStorage::new().with_file("assets/a/escaped.css", "body {}");

        let err = prepare_assets(&index, &snapshot, &media, &root).unwrap_err();

        assert!(matches!(err, SiteError::InvalidAsset { .. }));
        assert!(!dir.path().join("escaped.css").exists());
    }

    #[test]
    fn test_write_file_rejects_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");

        let err = write_file(&root, "imgs/../../x.png".to_owned(), b"png").unwrap_err();

        assert!(matches!(err, SiteError::InvalidAsset { .. }));
        assert!(!dir.path().join("x.png").exists());
    }

    #[test]
    fn test_same_path_on_two_pages_is_rejected() {
        let index = page(1, PageType::Index, "", "");
        let mut snapshot = snapshot(
            index,
            None,
            vec![
                asset(10, 1, FileType::Css, "css", "style.css", "assets/a/style.css"),
                asset(11, 2, FileType::Css, "css", "style.css", "assets/b/style.css"),
            ],
        );
        assert!(check_asset_paths(&snapshot).is_ok());

        snapshot.index.newsitems_variable = Some("latest_news".to_owned());
        snapshot.news = Some(loris_model::NewsSection {
            page: loris_model::NewsPage {
                page: page(2, PageType::News, "news", ""),
                index_page_id: 1,
            },
            items: Vec::new(),
        });

        let err = check_asset_paths(&snapshot).unwrap_err();
        match err {
            SiteError::DuplicateAsset { path } => assert_eq!(path, "css/style.css"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
