//! `loris site` subcommand group.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Subcommand};
use loris_db::NewSite;
use loris_model::SyncTarget;
use loris_publish::{S3BucketClient, S3Settings, SyncOptions, publish_site};
use loris_site::{check_asset_paths, check_expected_assets, instantiate_site};

use super::{GlobalArgs, Session};
use crate::error::CliError;
use crate::output::Output;

/// Static site commands.
#[derive(Subcommand)]
pub(crate) enum SiteCommand {
    /// Create a site for an organization.
    Create(CreateArgs),
    /// List sites.
    List(ListArgs),
    /// Check that every file the page templates reference is registered.
    Check(SiteArgs),
    /// Instantiate a site into a local directory.
    Build(BuildArgs),
    /// Instantiate a site and sync it to its staging or production bucket.
    Sync(SyncArgs),
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Owning organization id.
    #[arg(long)]
    org: i64,

    /// Site name, unique within the organization.
    #[arg(long)]
    name: String,

    #[arg(long)]
    staging_bucket: String,

    #[arg(long)]
    production_bucket: String,
}

#[derive(Args)]
pub(crate) struct ListArgs {
    /// Only list sites of this organization.
    #[arg(long)]
    org: Option<i64>,
}

#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Site id.
    site: i64,
}

#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Site id.
    site: i64,

    /// Output directory.
    #[arg(short, long, default_value = "site")]
    output: PathBuf,
}

#[derive(Args)]
pub(crate) struct SyncArgs {
    /// Site id.
    site: i64,

    /// Sync to the production bucket instead of staging.
    #[arg(long)]
    production: bool,

    /// Delete bucket objects the site no longer produces.
    #[arg(long)]
    prune: bool,

    /// Upload every file, even unchanged ones.
    #[arg(long)]
    force: bool,

    /// Show what would change without touching the bucket.
    #[arg(long)]
    dry_run: bool,
}

impl SiteCommand {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;

        let result = match self {
            Self::Create(args) => create(&session, global, args, &output).await,
            Self::List(args) => list(&session, args, &output).await,
            Self::Check(args) => check(&session, args.site, &output).await,
            Self::Build(args) => build(&session, args, &output).await,
            Self::Sync(args) => sync(&session, args, &output).await,
        };

        session.db.close().await;
        result
    }
}

async fn create(
    session: &Session,
    global: &GlobalArgs,
    args: CreateArgs,
    output: &Output,
) -> Result<(), CliError> {
    let actor = session.actor(global).await?;
    let site = session
        .db
        .create_site(
            NewSite {
                organization_id: args.org,
                name: args.name,
                staging_bucket: args.staging_bucket,
                production_bucket: args.production_bucket,
            },
            actor.id,
        )
        .await?;
    output.success(&format!("Created site {} with id {}", site.name, site.id));
    Ok(())
}

async fn list(session: &Session, args: ListArgs, output: &Output) -> Result<(), CliError> {
    for site in session.db.list_sites(args.org).await? {
        output.highlight(&format!("[{}] {}", site.id, site.name));
        for target in [SyncTarget::Staging, SyncTarget::Production] {
            let last = site
                .last_sync(target)
                .map_or_else(|| "never synced".to_owned(), |at| format!("synced {at}"));
            output.item(&format!("{target}: s3://{} ({last})", site.bucket_for(target)));
        }
    }
    Ok(())
}

async fn check(session: &Session, site_id: i64, output: &Output) -> Result<(), CliError> {
    let snapshot = session.db.load_site_snapshot(site_id).await?;
    let registered = snapshot.registered_relpaths();
    check_asset_paths(&snapshot)?;

    for page in snapshot.published_pages() {
        let expected = check_expected_assets(page, &registered)?;
        output.info(&format!(
            "{}: {} referenced files registered",
            page.relative_filepath(),
            expected.len()
        ));
    }
    output.success(&format!("Site {} is ready to publish", snapshot.site.name));
    Ok(())
}

async fn build(session: &Session, args: BuildArgs, output: &Output) -> Result<(), CliError> {
    let snapshot = session.db.load_site_snapshot(args.site).await?;
    std::fs::create_dir_all(&args.output)?;

    output.info(&format!(
        "Building {} into {}",
        snapshot.site.name,
        args.output.display()
    ));
    let pages = instantiate_site(
        &snapshot,
        &session.media(),
        &args.output,
        &session.instantiate_settings(),
    )?;

    for page in &pages {
        for file in page.html_files.iter().chain(&page.asset_files) {
            output.item(&file.relative_path);
        }
    }
    let files: usize = pages
        .iter()
        .map(|p| p.html_files.len() + p.asset_files.len())
        .sum();
    output.success(&format!("Wrote {files} files"));
    Ok(())
}

async fn sync(session: &Session, args: SyncArgs, output: &Output) -> Result<(), CliError> {
    let target = SyncTarget::from_production_flag(args.production);
    let options = SyncOptions {
        prune: args.prune,
        force: args.force,
        dry_run: args.dry_run,
    };
    let snapshot = session.db.load_site_snapshot(args.site).await?;
    let client = S3BucketClient::connect(&S3Settings {
        endpoint: session.config.s3.endpoint.clone(),
        region: session.config.s3.region.clone(),
    })
    .await;

    output.info(&format!(
        "Syncing {} to {target} (s3://{})",
        snapshot.site.name,
        snapshot.site.bucket_for(target)
    ));
    let report = publish_site(
        &client,
        &snapshot,
        &session.media(),
        &session.instantiate_settings(),
        target,
        options,
    )
    .await?;

    for key in &report.transferred {
        output.item(&format!("upload {key}"));
    }
    for key in &report.deleted {
        output.item(&format!("delete {key}"));
    }

    if report.dry_run {
        output.warning(&format!(
            "Dry run: {} to upload, {} unchanged, {} to delete",
            report.transferred.len(),
            report.skipped.len(),
            report.deleted.len()
        ));
        return Ok(());
    }

    session.db.record_sync(args.site, target, Utc::now()).await?;
    output.success(&format!(
        "Synced s3://{}: {} uploaded, {} unchanged, {} deleted",
        report.bucket,
        report.transferred.len(),
        report.skipped.len(),
        report.deleted.len()
    ));
    Ok(())
}
