//! Paginated news page rendering.

use std::path::Path;

use loris_media::MediaStorage;
use loris_model::{NewsSection, Page, join_relpath, paginate, validate_filename};
use minijinja::Value;

use crate::assets::write_file;
use crate::render::{base_context, news_items_value, render};
use crate::{RenderedFile, SiteError};

/// Files written for a news section.
#[derive(Debug, Default)]
pub struct NewsOutput {
    /// One HTML file per page, in page order.
    pub pages: Vec<RenderedFile>,
    /// Images of the published items.
    pub images: Vec<RenderedFile>,
}

/// Render every page of published news into `root` and copy the images of
/// the items shown.
///
/// Pages are named after the news page's filename with the page index
/// appended (`news_0.html`, `news_1.html`, ...).
pub fn instantiate_news(
    site_name: &str,
    section: &NewsSection,
    media: &dyn MediaStorage,
    root: &Path,
    items_per_page: usize,
) -> Result<NewsOutput, SiteError> {
    let page: &Page = &section.page.page;
    let chunks = paginate(&section.items, items_per_page);
    let total_pages = chunks.len();
    let filenames: Vec<String> = (0..total_pages)
        .map(|n| section.page.page_filename(n))
        .collect();

    let mut output = NewsOutput::default();
    for (index, items) in chunks.iter().enumerate() {
        let filename = &filenames[index];
        let mut context = base_context(site_name, page);
        context.insert("news_items".to_owned(), news_items_value(items));
        context.insert("page_index".to_owned(), Value::from(index));
        context.insert("page_number".to_owned(), Value::from(index + 1));
        context.insert("total_pages".to_owned(), Value::from(total_pages));
        context.insert(
            "previous_page".to_owned(),
            index
                .checked_sub(1)
                .map_or(Value::from(()), |prev| Value::from(filenames[prev].clone())),
        );
        context.insert(
            "next_page".to_owned(),
            filenames
                .get(index + 1)
                .map_or(Value::from(()), |next| Value::from(next.clone())),
        );
        context.insert("pages".to_owned(), Value::from_serialize(&filenames));

        let html = render(page, filename, &context)?;
        let file = write_file(
            root,
            join_relpath(&page.relative_path, filename),
            html.as_bytes(),
        )?;
        tracing::info!(page = %file.relative_path, items = items.len(), "Rendered news page");
        output.pages.push(file);

        for item in items {
            let (Some(image), Some(relative_path)) = (&item.image, item.image_filepath()) else {
                continue;
            };
            validate_filename("news_item.image", &image.filename).map_err(|source| {
                SiteError::InvalidAsset {
                    path: relative_path.clone(),
                    source,
                }
            })?;
            tracing::info!(image = %relative_path, root = %root.display(), "Writing news image");
            let content = media.read(&image.content_key)?;
            output.images.push(write_file(root, relative_path, &content)?);
        }
    }

    Ok(output)
}
