//! News items and the pagination arithmetic of the news section.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Audit, ModelError, validate_length};

/// Directory news images are published to unless an item says otherwise.
pub const DEFAULT_IMAGE_RELPATH: &str = "imgs/news";

/// Uploaded image attached to a news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsImage {
    pub filename: String,
    /// Key of the uploaded content in media storage.
    pub content_key: String,
}

/// A single news entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub id: i64,
    pub news_page_id: i64,
    pub title: String,
    pub text: String,
    pub publish_on: DateTime<Utc>,
    pub is_published: bool,
    pub image: Option<NewsImage>,
    /// Normalized site directory the image is published to.
    pub image_relpath: String,
    pub audit: Audit,
}

impl NewsItem {
    pub fn validate_fields(title: &str, text: &str) -> Result<(), ModelError> {
        validate_length("news_item.title", title, 0, 255)?;
        validate_length("news_item.text", text, 10, usize::MAX)?;
        Ok(())
    }

    /// Site-relative path of the published image, if any.
    pub fn image_filepath(&self) -> Option<String> {
        self.image
            .as_ref()
            .map(|image| crate::join_relpath(&self.image_relpath, &image.filename))
    }
}

/// Published items, newest first. Ties on `publish_on` fall back to id.
pub fn published_sorted(items: &[NewsItem]) -> Vec<&NewsItem> {
    let mut published: Vec<&NewsItem> = items.iter().filter(|i| i.is_published).collect();
    published.sort_by(|a, b| {
        b.publish_on
            .cmp(&a.publish_on)
            .then_with(|| b.id.cmp(&a.id))
    });
    published
}

/// The latest `n` published items.
pub fn latest_published(items: &[NewsItem], n: usize) -> Vec<&NewsItem> {
    let mut published = published_sorted(items);
    published.truncate(n);
    published
}

/// Number of news pages needed for `published_count` items.
///
/// `per_page` of zero is treated as one item per page.
pub fn total_pages(published_count: usize, per_page: usize) -> usize {
    published_count.div_ceil(per_page.max(1))
}

/// Split published items into pages of `per_page`.
///
/// Always returns at least one page, so a site with no published news still
/// gets an (empty) first news page for its links to land on.
pub fn paginate(items: &[NewsItem], per_page: usize) -> Vec<Vec<&NewsItem>> {
    let published = published_sorted(items);
    if published.is_empty() {
        return vec![Vec::new()];
    }
    published
        .chunks(per_page.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    fn item(id: i64, publish_on: DateTime<Utc>, is_published: bool) -> NewsItem {
        NewsItem {
            id,
            news_page_id: 1,
            title: format!("newsitem({id})"),
            text: "some news text".to_owned(),
            publish_on,
            is_published,
            image: None,
            image_relpath: DEFAULT_IMAGE_RELPATH.to_owned(),
            audit: Audit::created_now(1),
        }
    }

    fn batch(start_id: i64, count: i64, publish_on: DateTime<Utc>, published: bool) -> Vec<NewsItem> {
        (start_id..start_id + count)
            .map(|id| item(id, publish_on, published))
            .collect()
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(15, 10), 2);
        assert_eq!(total_pages(12, 5), 3);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(0, 5), 0);
    }

    #[test]
    fn test_latest_published_orders_by_date() {
        let now = Utc::now();
        let one_day_ago = now - Duration::days(1);
        let two_days_ago = now - Duration::days(2);

        let mut items = batch(1, 3, one_day_ago, true);
        items.extend(batch(10, 5, two_days_ago, true));
        items.extend(batch(100, 25, one_day_ago, false));

        let latest = latest_published(&items, 5);

        assert_eq!(latest.len(), 5);
        assert_eq!(
            latest.iter().filter(|i| i.publish_on == one_day_ago).count(),
            3
        );
        assert_eq!(
            latest.iter().filter(|i| i.publish_on == two_days_ago).count(),
            2
        );
        assert!(latest.iter().all(|i| i.is_published));
    }

    #[test]
    fn test_paginate_single_page() {
        let now = Utc::now();
        let mut items = batch(1, 1, now - Duration::days(1), true);
        items.extend(batch(10, 25, now + Duration::days(1), false));

        let pages = paginate(&items, 3);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 1);
    }

    #[test]
    fn test_paginate_multi_page() {
        let now = Utc::now();
        let mut items = batch(1, 12, now - Duration::days(1), true);
        items.extend(batch(100, 25, now + Duration::days(1), false));

        let pages = paginate(&items, 5);

        assert_eq!(pages.len(), total_pages(12, 5));
        assert_eq!(
            pages.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![5, 5, 2]
        );
    }

    #[test]
    fn test_paginate_empty_yields_one_page() {
        let pages = paginate(&[], 5);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_image_filepath() {
        let mut news = item(1, Utc::now(), true);
        assert_eq!(news.image_filepath(), None);
        news.image = Some(NewsImage {
            filename: "sample-photo.jpeg".to_owned(),
            content_key: "news/abc/sample-photo.jpeg".to_owned(),
        });
        assert_eq!(
            news.image_filepath().as_deref(),
            Some("imgs/news/sample-photo.jpeg")
        );
    }

    #[test]
    fn test_text_min_length() {
        assert!(NewsItem::validate_fields("title", "text").is_err());
        assert!(NewsItem::validate_fields("title", "long enough text").is_ok());
    }
}
