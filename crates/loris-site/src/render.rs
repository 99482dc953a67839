//! Template rendering.

use std::collections::BTreeMap;

use loris_model::{NewsItem, Page, root_prefix};
use minijinja::{Environment, Value};
use serde::Serialize;

use crate::SiteError;

/// A news item as exposed to templates.
#[derive(Debug, Serialize)]
pub(crate) struct NewsItemContext<'a> {
    id: i64,
    title: &'a str,
    text: &'a str,
    /// RFC 3339 timestamp.
    publish_on: String,
    /// Site-relative image path.
    image: Option<String>,
}

impl<'a> NewsItemContext<'a> {
    pub(crate) fn new(item: &'a NewsItem) -> Self {
        Self {
            id: item.id,
            title: &item.title,
            text: &item.text,
            publish_on: item.publish_on.to_rfc3339(),
            image: item.image_filepath(),
        }
    }
}

pub(crate) fn news_items_value(items: &[&NewsItem]) -> Value {
    let items: Vec<NewsItemContext<'_>> = items.iter().map(|i| NewsItemContext::new(i)).collect();
    Value::from_serialize(&items)
}

/// Variables available to every page.
pub(crate) fn base_context(site_name: &str, page: &Page) -> BTreeMap<String, Value> {
    let mut context = BTreeMap::new();
    context.insert("site_name".to_owned(), Value::from(site_name));
    // Only ever "../" segments, so it is left unescaped.
    context.insert(
        "root_prefix".to_owned(),
        Value::from_safe_string(root_prefix(&page.relative_path)),
    );
    context
}

/// Render `page`'s template to the file named `output_name`.
///
/// The output name picks the auto-escape mode, so `.html` pages escape
/// interpolated values.
pub(crate) fn render(
    page: &Page,
    output_name: &str,
    context: &BTreeMap<String, Value>,
) -> Result<String, SiteError> {
    let env = Environment::new();
    env.render_named_str(output_name, &page.template, context)
        .map_err(|source| SiteError::Render {
            page: output_name.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use loris_model::PageType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::page;

    #[test]
    fn test_html_output_is_escaped() {
        let page = page(1, PageType::Index, "", "<h1>{{ site_name }}</h1>");
        let context = base_context("Fish & <Chips>", &page);

        let html = render(&page, "index.html", &context).unwrap();

        assert_eq!(html, "<h1>Fish &amp; &lt;Chips&gt;</h1>");
    }

    #[test]
    fn test_root_prefix_for_nested_page() {
        let page = page(1, PageType::News, "news/archive", "{{ root_prefix }}css/a.css");
        let context = base_context("Site", &page);

        let html = render(&page, "news_0.html", &context).unwrap();

        assert_eq!(html, "../../css/a.css");
    }

    #[test]
    fn test_syntax_error_names_page() {
        let page = page(1, PageType::Index, "", "{% for %}");
        let err = render(&page, "index.html", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, SiteError::Render { ref page, .. } if page == "index.html"));
    }
}
