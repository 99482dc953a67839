//! `loris news` subcommand group.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use loris_db::NewNewsItem;
use loris_media::{MediaStorage, upload_key};
use loris_model::NewsImage;

use super::{GlobalArgs, Session, file_name};
use crate::error::CliError;
use crate::output::Output;

/// News item commands.
#[derive(Subcommand)]
pub(crate) enum NewsCommand {
    /// Add a news item to a site's news page.
    Add(AddArgs),
    /// Publish a news item.
    Publish(ItemArgs),
    /// Withdraw a published news item.
    Unpublish(ItemArgs),
    /// List the news items of a site, newest first.
    List(ListArgs),
}

#[derive(Args)]
pub(crate) struct AddArgs {
    /// Site id.
    site: i64,

    #[arg(long, default_value = "")]
    title: String,

    /// Item text (at least 10 characters).
    #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
    text: Option<String>,

    /// Read the item text from a file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Publication time, RFC 3339 (default: now).
    #[arg(long)]
    publish_on: Option<DateTime<Utc>>,

    /// Publish immediately.
    #[arg(long)]
    publish: bool,

    /// Image to show with the item.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Directory inside the site the image is written to (default: imgs/news).
    #[arg(long)]
    image_relpath: Option<String>,
}

#[derive(Args)]
pub(crate) struct ItemArgs {
    /// News item id.
    item: i64,
}

#[derive(Args)]
pub(crate) struct ListArgs {
    /// Site id.
    site: i64,
}

impl NewsCommand {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;

        let result = match self {
            Self::Add(args) => add(&session, global, args, &output).await,
            Self::Publish(args) => set_published(&session, global, args.item, true, &output).await,
            Self::Unpublish(args) => {
                set_published(&session, global, args.item, false, &output).await
            }
            Self::List(args) => list(&session, args.site, &output).await,
        };

        session.db.close().await;
        result
    }
}

async fn news_page_id(session: &Session, site_id: i64) -> Result<i64, CliError> {
    let page = session.db.get_news_page(site_id).await?.ok_or_else(|| {
        CliError::Validation(format!("Site {site_id} has no news page; run `loris page set-news`"))
    })?;
    Ok(page.page.id)
}

async fn add(
    session: &Session,
    global: &GlobalArgs,
    args: AddArgs,
    output: &Output,
) -> Result<(), CliError> {
    let actor = session.actor(global).await?;
    let news_page_id = news_page_id(session, args.site).await?;
    let text = match (args.text, &args.text_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => String::new(),
    };

    let image = match &args.image {
        Some(path) => {
            let filename = file_name(path)?;
            let content_key = upload_key("news", &filename);
            session.media().write(&content_key, &std::fs::read(path)?)?;
            Some(NewsImage {
                filename,
                content_key,
            })
        }
        None => None,
    };

    let item = session
        .db
        .create_news_item(
            NewNewsItem {
                news_page_id,
                title: args.title,
                text,
                publish_on: args.publish_on.unwrap_or_else(Utc::now),
                is_published: args.publish,
                image,
                image_relpath: args.image_relpath,
            },
            actor.id,
        )
        .await?;

    let state = if item.is_published { "published" } else { "draft" };
    output.success(&format!("Added news item {} ({state})", item.id));
    Ok(())
}

async fn set_published(
    session: &Session,
    global: &GlobalArgs,
    item_id: i64,
    is_published: bool,
    output: &Output,
) -> Result<(), CliError> {
    let actor = session.actor(global).await?;
    let item = session
        .db
        .set_published(item_id, is_published, actor.id)
        .await?;
    if item.is_published {
        output.success(&format!("Published news item {}", item.id));
    } else {
        output.success(&format!("Unpublished news item {}", item.id));
    }
    Ok(())
}

async fn list(session: &Session, site_id: i64, output: &Output) -> Result<(), CliError> {
    let news_page_id = news_page_id(session, site_id).await?;
    for item in session.db.list_news_items(news_page_id).await? {
        let marker = if item.is_published { "*" } else { " " };
        output.info(&format!(
            "{marker} [{}] {} {}",
            item.id,
            item.publish_on.format("%Y-%m-%d %H:%M"),
            item.title
        ));
        if let Some(path) = item.image_filepath() {
            output.item(&path);
        }
    }
    Ok(())
}
