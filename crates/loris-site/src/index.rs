//! Index page rendering.

use std::path::Path;

use loris_model::{SiteSnapshot, join_relpath, latest_published};
use minijinja::Value;

use crate::assets::write_file;
use crate::render::{base_context, news_items_value, render};
use crate::{InstantiateSettings, RenderedFile, SiteError};

/// Render the site's index page into `root`.
///
/// When the page binds a news variable, it receives the latest published
/// items and `news_url` points at the first news page.
pub fn instantiate_index(
    snapshot: &SiteSnapshot,
    root: &Path,
    settings: &InstantiateSettings,
) -> Result<RenderedFile, SiteError> {
    let index = &snapshot.index;
    let mut context = base_context(&snapshot.site.name, &index.page);

    if let Some(variable) = index.newsitems_variable.as_deref().filter(|_| index.has_news()) {
        let section = snapshot
            .news
            .as_ref()
            .ok_or_else(|| SiteError::NewsPageMissing {
                site: snapshot.site.name.clone(),
            })?;
        let latest = latest_published(&section.items, settings.max_index_news_items);
        context.insert(variable.to_owned(), news_items_value(&latest));
        context.insert(
            "news_url".to_owned(),
            Value::from(join_relpath(
                &section.page.page.relative_path,
                &section.page.page_filename(0),
            )),
        );
    }

    let html = render(&index.page, &index.page.filename, &context)?;
    let file = write_file(root, index.page.relative_filepath(), html.as_bytes())?;
    tracing::info!(page = %file.relative_path, "Rendered index page");
    Ok(file)
}
