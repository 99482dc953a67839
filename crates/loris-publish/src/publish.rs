//! Instantiate a site and sync it to one of its buckets.

use loris_media::MediaStorage;
use loris_model::{SiteSnapshot, SyncTarget};
use loris_site::{InstantiateSettings, instantiate_site};

use crate::{BucketClient, SyncError, SyncOptions, SyncReport, sync_directory};

/// Render the site into a scratch directory and sync it to the bucket for
/// `target`.
///
/// The scratch directory is named `site-{organization_id}_…` and removed
/// when the sync finishes, whether or not it succeeded. Recording the sync
/// time on the site is left to the caller.
pub async fn publish_site(
    client: &dyn BucketClient,
    snapshot: &SiteSnapshot,
    media: &dyn MediaStorage,
    settings: &InstantiateSettings,
    target: SyncTarget,
    options: SyncOptions,
) -> Result<SyncReport, SyncError> {
    let bucket = snapshot.site.bucket_for(target);
    let scratch = tempfile::Builder::new()
        .prefix(&format!("site-{}_", snapshot.organization_id()))
        .tempdir()
        .map_err(|e| SyncError::io(std::env::temp_dir(), e))?;

    instantiate_site(snapshot, media, scratch.path(), settings)?;
    let report = sync_directory(client, scratch.path(), bucket, options).await?;

    tracing::info!(
        site = %snapshot.site.name,
        %target,
        bucket,
        transferred = report.transferred.len(),
        skipped = report.skipped.len(),
        deleted = report.deleted.len(),
        dry_run = report.dry_run,
        "Site synced"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use loris_media::MockMediaStorage;
    use loris_model::{
        Audit, FileType, IndexPage, NewsItem, NewsPage, NewsSection, Page, PageAsset, PageType,
        StaticSite,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::MockBucketClient;

    fn page(id: i64, page_type: PageType, filename: &str, relative_path: &str, template: &str) -> Page {
        Page {
            id,
            site_id: 1,
            page_type,
            filename: filename.to_owned(),
            relative_path: relative_path.to_owned(),
            template: template.to_owned(),
            audit: Audit::created_now(1),
        }
    }

    fn snapshot() -> SiteSnapshot {
        let items = (1..=15)
            .map(|id| NewsItem {
                id,
                news_page_id: 2,
                title: format!("Item {id}"),
                text: "Published news text".to_owned(),
                publish_on: Utc::now(),
                is_published: true,
                image: None,
                image_relpath: "imgs/news".to_owned(),
                audit: Audit::created_now(1),
            })
            .collect();
        SiteSnapshot {
            site: StaticSite {
                id: 1,
                organization_id: 42,
                name: "Example".to_owned(),
                staging_bucket: "example-staging".to_owned(),
                production_bucket: "example-production".to_owned(),
                last_staging_sync: None,
                last_production_sync: None,
                audit: Audit::created_now(1),
            },
            index: IndexPage {
                page: page(
                    1,
                    PageType::Index,
                    "index.html",
                    "",
                    r#"<link href="css/style.css">{% for n in news %}{{ n.title }}{% endfor %}"#,
                ),
                newsitems_variable: Some("news".to_owned()),
            },
            news: Some(NewsSection {
                page: NewsPage {
                    page: page(2, PageType::News, "news.html", "news", "{{ page_number }}"),
                    index_page_id: 1,
                },
                items,
            }),
            assets: vec![PageAsset {
                id: 1,
                page_id: 1,
                file_type: FileType::Css,
                filename: "style.css".to_owned(),
                relative_path: "css".to_owned(),
                content_key: "assets/x/style.css".to_owned(),
                audit: Audit::created_now(1),
            }],
        }
    }

    #[tokio::test]
    async fn test_publish_to_staging() {
        let client = MockBucketClient::new();
        let media = MockMediaStorage::new().with_file("assets/x/style.css", "body {}");

        let report = publish_site(
            &client,
            &snapshot(),
            &media,
            &InstantiateSettings::default(),
            SyncTarget::Staging,
            SyncOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.bucket, "example-staging");
        assert_eq!(
            report.transferred,
            [
                "css/style.css",
                "index.html",
                "news/news_0.html",
                "news/news_1.html",
                "news/news_2.html",
            ]
        );
        assert!(client.keys("example-production").is_empty());
    }

    #[tokio::test]
    async fn test_publish_to_production() {
        let client = MockBucketClient::new();
        let media = MockMediaStorage::new().with_file("assets/x/style.css", "body {}");

        let report = publish_site(
            &client,
            &snapshot(),
            &media,
            &InstantiateSettings::default(),
            SyncTarget::Production,
            SyncOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.bucket, "example-production");
        assert_eq!(client.keys("example-production").len(), 5);
        assert!(client.keys("example-staging").is_empty());
    }

    #[tokio::test]
    async fn test_publish_stops_on_missing_asset() {
        let client = MockBucketClient::new();
        let mut snapshot = snapshot();
        snapshot.assets.clear();

        let err = publish_site(
            &client,
            &snapshot,
            &MockMediaStorage::new(),
            &InstantiateSettings::default(),
            SyncTarget::Staging,
            SyncOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SyncError::Site(_)));
        assert!(client.keys("example-staging").is_empty());
    }
}
