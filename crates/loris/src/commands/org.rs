//! `loris org` subcommand group.

use clap::{Args, Subcommand};

use super::{GlobalArgs, Session};
use crate::error::CliError;
use crate::output::Output;

/// Organization commands.
#[derive(Subcommand)]
pub(crate) enum OrgCommand {
    /// Create an organization.
    Create(CreateArgs),
    /// Register an email domain whose users join the organization.
    AddDomain(AddDomainArgs),
    /// List organizations with their email domains.
    List,
    /// Mark an organization inactive.
    Deactivate(DeactivateArgs),
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Organization name.
    name: String,

    /// Email domains to register right away.
    #[arg(long = "domain")]
    domains: Vec<String>,
}

#[derive(Args)]
pub(crate) struct AddDomainArgs {
    /// Organization id.
    org: i64,

    /// Email domain, e.g. `example.com`.
    domain: String,
}

#[derive(Args)]
pub(crate) struct DeactivateArgs {
    /// Organization id.
    org: i64,
}

impl OrgCommand {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;

        match self {
            Self::Create(args) => {
                let actor = session.actor(global).await?;
                let org = session.db.create_organization(&args.name, actor.id).await?;
                for domain in &args.domains {
                    session.db.add_email_domain(org.id, domain, actor.id).await?;
                }
                output.success(&format!("Created {org} with id {}", org.id));
            }
            Self::AddDomain(args) => {
                let actor = session.actor(global).await?;
                let domain = session
                    .db
                    .add_email_domain(args.org, &args.domain, actor.id)
                    .await?;
                output.success(&format!(
                    "Registered @{} for organization {}",
                    domain.domain, args.org
                ));
            }
            Self::List => {
                for org in session.db.list_organizations().await? {
                    let status = if org.is_active { "" } else { " (inactive)" };
                    output.highlight(&format!("[{}] {}{status}", org.id, org.name));
                    for domain in session.db.list_email_domains(org.id).await? {
                        output.item(&format!("@{}", domain.domain));
                    }
                }
            }
            Self::Deactivate(args) => {
                let actor = session.actor(global).await?;
                let org = session
                    .db
                    .set_organization_active(args.org, false, actor.id)
                    .await?;
                output.success(&format!("Deactivated {org}"));
            }
        }

        session.db.close().await;
        Ok(())
    }
}
