//! `loris user` subcommand group.

use clap::{Args, Subcommand};
use loris_db::UserCreateOptions;
use loris_model::NewUser;

use super::{GlobalArgs, Session};
use crate::error::CliError;
use crate::output::Output;

/// User commands.
#[derive(Subcommand)]
pub(crate) enum UserCommand {
    /// Create a user. Staff users join the organization owning their email domain.
    Create(CreateArgs),
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,

    /// Create a superuser (no organization).
    #[arg(long)]
    superuser: bool,

    /// Create the user even if no organization owns the email domain.
    #[arg(long)]
    ignore_email_domain_check: bool,
}

impl UserCommand {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;

        match self {
            Self::Create(args) => {
                let new_user = NewUser {
                    username: args.username,
                    email: args.email,
                    first_name: args.first_name,
                    last_name: args.last_name,
                    is_superuser: args.superuser,
                    is_staff: args.superuser,
                };
                let options = UserCreateOptions {
                    ignore_email_domain_check: args.ignore_email_domain_check,
                };
                if options.ignore_email_domain_check && !new_user.is_superuser {
                    output.warning("Ignoring EMAIL DOMAIN check on user creation!");
                }
                let user = session.db.create_user(new_user, options).await?;
                match user.organization_id {
                    Some(org) => output.success(&format!(
                        "Created user {} in organization {org}",
                        user.username
                    )),
                    None => output.success(&format!("Created user {}", user.username)),
                }
            }
        }

        session.db.close().await;
        Ok(())
    }
}
