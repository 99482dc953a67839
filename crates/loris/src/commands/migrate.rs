//! `loris migrate` command implementation.

use clap::Args;

use super::{GlobalArgs, Session};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the migrate command.
#[derive(Args)]
pub(crate) struct MigrateArgs;

impl MigrateArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;

        output.info(&format!(
            "Migrating {}",
            session.config.database_resolved.url
        ));
        let applied = session.db.migrate().await?;
        session.db.close().await;

        if applied == 0 {
            output.info("Database is up to date");
        } else {
            output.success(&format!("Applied {applied} migrations"));
        }
        Ok(())
    }
}
