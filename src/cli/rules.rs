//! Rewrite-rule lookups

use clap::Subcommand;

use crate::cli::Session;
use crate::core::error::Result;

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// Where exactly these virtual keys are defined
    #[command(after_help = "EXAMPLES:
    vosadmin rules search 190012 190013")]
    Search {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Virtual keys containing a term
    Keys { term: String },

    /// How one virtual key is set up in one Routing Gateway
    Status {
        server: String,
        rg: String,
        vn: String,
    },
}

pub async fn run(cmd: RulesCommand, session: &Session) -> Result<()> {
    match cmd {
        RulesCommand::Search { keys } => {
            let found = session
                .scope
                .run(session.client.find_rule_definitions(&keys))
                .await?;
            session.print(&found);
        }
        RulesCommand::Keys { term } => {
            let found = session.scope.run(session.client.find_rule_keys(&term)).await?;
            session.print(&found);
        }
        RulesCommand::Status { server, rg, vn } => {
            let ctx = session.server(&server).await?;
            let status = session.scope.run(ctx.virtual_number_status(&rg, &vn)).await?;
            session.print(&status);
        }
    }
    Ok(())
}
