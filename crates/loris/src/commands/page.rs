//! `loris page` subcommand group.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use loris_db::{IndexPageInput, NewsPageInput};

use super::{GlobalArgs, Session};
use crate::error::CliError;
use crate::output::Output;

/// Page commands.
#[derive(Subcommand)]
pub(crate) enum PageCommand {
    /// Create or replace the index page of a site.
    SetIndex(SetIndexArgs),
    /// Create or replace the news page of a site.
    SetNews(SetNewsArgs),
}

#[derive(Args)]
pub(crate) struct SetIndexArgs {
    /// Site id.
    site: i64,

    /// Template file (Jinja syntax).
    #[arg(long)]
    template: PathBuf,

    /// Directory inside the site the page is written to.
    #[arg(long, default_value = ".")]
    relative_path: String,

    /// Template variable bound to the latest news items.
    #[arg(long)]
    newsitems_variable: Option<String>,
}

#[derive(Args)]
pub(crate) struct SetNewsArgs {
    /// Site id.
    site: i64,

    /// Template file (Jinja syntax).
    #[arg(long)]
    template: PathBuf,

    /// Base filename; pages are written as `<stem>_<n>.<ext>` (default: news.html).
    #[arg(long)]
    filename: Option<String>,

    /// Directory inside the site the pages are written to (default: news).
    #[arg(long)]
    relative_path: Option<String>,
}

impl PageCommand {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;
        let actor = session.actor(global).await?;

        match self {
            Self::SetIndex(args) => {
                let template = std::fs::read_to_string(&args.template)?;
                let index = session
                    .db
                    .set_index_page(
                        args.site,
                        IndexPageInput {
                            relative_path: args.relative_path,
                            template,
                            newsitems_variable: args.newsitems_variable,
                        },
                        actor.id,
                    )
                    .await?;
                output.success(&format!("Index page set: {}", index.page.relative_filepath()));
                if !index.has_news() {
                    output.info("News is disabled for this site");
                }
            }
            Self::SetNews(args) => {
                let template = std::fs::read_to_string(&args.template)?;
                let news = session
                    .db
                    .set_news_page(
                        args.site,
                        NewsPageInput {
                            filename: args.filename,
                            relative_path: args.relative_path,
                            template,
                        },
                        actor.id,
                    )
                    .await?;
                output.success(&format!(
                    "News page set: {}",
                    news.page.relative_filepath()
                ));
            }
        }

        session.db.close().await;
        Ok(())
    }
}
