//! Loading everything needed to instantiate a site.

use loris_model::{NewsSection, SiteSnapshot};

use crate::{Database, DbError};

impl Database {
    /// Load a site with its pages, assets and news items.
    ///
    /// The news section is only loaded when the index page binds a news
    /// variable.
    pub async fn load_site_snapshot(&self, site_id: i64) -> Result<SiteSnapshot, DbError> {
        let site = self.get_site(site_id).await?;
        let index = self
            .get_index_page(site_id)
            .await?
            .ok_or_else(|| DbError::not_found("index page", site_id))?;

        let news = if index.has_news() {
            match self.get_news_page(site_id).await? {
                Some(page) => {
                    let items = self.list_news_items(page.page.id).await?;
                    Some(NewsSection { page, items })
                }
                None => None,
            }
        } else {
            None
        };

        let assets = self.list_assets_for_site(site_id).await?;
        tracing::debug!(
            site_id,
            assets = assets.len(),
            news_items = news.as_ref().map_or(0, |n| n.items.len()),
            "Loaded site snapshot"
        );
        Ok(SiteSnapshot {
            site,
            index,
            news,
            assets,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use loris_model::FileType;

    use crate::sites::tests::create_site;
    use crate::testing::fixture;
    use crate::{DbError, IndexPageInput, NewAsset, NewNewsItem, NewsPageInput};

    #[tokio::test]
    async fn test_snapshot_requires_index_page() {
        let fx = fixture().await;
        let site = create_site(&fx).await;

        let err = fx.db.load_site_snapshot(site.id).await.unwrap_err();

        assert!(matches!(err, DbError::NotFound { entity: "index page", .. }));
    }

    #[tokio::test]
    async fn test_snapshot_collects_everything() {
        let fx = fixture().await;
        let site = create_site(&fx).await;
        let index = fx
            .db
            .set_index_page(
                site.id,
                IndexPageInput {
                    newsitems_variable: Some("latest".to_owned()),
                    ..IndexPageInput::default()
                },
                fx.admin.id,
            )
            .await
            .unwrap();
        let news = fx
            .db
            .set_news_page(site.id, NewsPageInput::default(), fx.admin.id)
            .await
            .unwrap();
        for page_id in [index.page.id, news.page.id] {
            fx.db
                .add_asset(
                    NewAsset {
                        page_id,
                        file_type: FileType::Css,
                        filename: format!("page{page_id}.css"),
                        relative_path: "css".to_owned(),
                        content_key: format!("assets/x/page{page_id}.css"),
                    },
                    fx.admin.id,
                )
                .await
                .unwrap();
        }
        fx.db
            .create_news_item(
                NewNewsItem {
                    news_page_id: news.page.id,
                    title: "Hello".to_owned(),
                    text: "Hello world news".to_owned(),
                    publish_on: Utc::now(),
                    is_published: true,
                    image: None,
                    image_relpath: None,
                },
                fx.admin.id,
            )
            .await
            .unwrap();

        let snapshot = fx.db.load_site_snapshot(site.id).await.unwrap();

        assert_eq!(snapshot.assets.len(), 2);
        assert_eq!(snapshot.assets_for(index.page.id).count(), 1);
        let section = snapshot.news.expect("news section");
        assert_eq!(section.page, news);
        assert_eq!(section.items.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_without_news_variable_skips_news() {
        let fx = fixture().await;
        let site = create_site(&fx).await;
        fx.db
            .set_index_page(site.id, IndexPageInput::default(), fx.admin.id)
            .await
            .unwrap();
        fx.db
            .set_news_page(site.id, NewsPageInput::default(), fx.admin.id)
            .await
            .unwrap();

        let snapshot = fx.db.load_site_snapshot(site.id).await.unwrap();

        assert!(snapshot.news.is_none());
    }
}
