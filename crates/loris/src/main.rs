//! Loris CLI - static site CMS and bucket publisher.
//!
//! Provides commands for:
//! - `migrate`: Create or upgrade the database schema
//! - `org`, `user`: Manage organizations, their email domains and users
//! - `site`, `page`, `asset`, `news`: Manage site content
//! - `site build` / `site sync`: Instantiate a site locally or sync it to S3

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    AssetCommand, GlobalArgs, MigrateArgs, NewsCommand, OrgCommand, PageCommand, SiteCommand,
    UserCommand,
};
use error::CliError;
use output::Output;

/// Loris - static site CMS and bucket publisher.
#[derive(Parser)]
#[command(name = "loris", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate(MigrateArgs),
    /// Organization commands.
    #[command(subcommand)]
    Org(OrgCommand),
    /// User commands.
    #[command(subcommand)]
    User(UserCommand),
    /// Static site commands.
    #[command(subcommand)]
    Site(SiteCommand),
    /// Index and news page commands.
    #[command(subcommand)]
    Page(PageCommand),
    /// Page asset commands.
    #[command(subcommand)]
    Asset(AssetCommand),
    /// News item commands.
    #[command(subcommand)]
    News(NewsCommand),
}

impl Commands {
    async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        match self {
            Self::Migrate(args) => args.execute(global).await,
            Self::Org(cmd) => cmd.execute(global).await,
            Self::User(cmd) => cmd.execute(global).await,
            Self::Site(cmd) => cmd.execute(global).await,
            Self::Page(cmd) => cmd.execute(global).await,
            Self::Asset(cmd) => cmd.execute(global).await,
            Self::News(cmd) => cmd.execute(global).await,
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(cli.command.execute(&cli.global))
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "loris",
            "--as-user",
            "editor",
            "site",
            "sync",
            "3",
            "--production",
            "--prune",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.global.as_user.as_deref(), Some("editor"));
        assert!(matches!(cli.command, Commands::Site(SiteCommand::Sync(_))));
    }

    #[test]
    fn test_user_create_flags_parse() {
        let cli = Cli::try_parse_from([
            "loris",
            "user",
            "create",
            "jdoe",
            "--email",
            "jdoe@example.com",
            "--ignore-email-domain-check",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::User(UserCommand::Create(_))));
    }
}
