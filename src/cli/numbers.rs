//! Number lookups

use clap::Subcommand;

use crate::cli::Session;
use crate::core::error::Result;
use crate::rules::parse_number_input;

#[derive(Subcommand, Debug)]
pub enum NumbersCommand {
    /// Every gateway field that mentions these numbers (0/84 forms included)
    #[command(after_help = "EXAMPLES:
    vosadmin numbers search 0912345678
    vosadmin numbers search \"0912345678, 84987654321\"")]
    Search {
        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Customers whose Mapping Gateway carries a virtual number
    Linked { vn: String },
}

pub async fn run(cmd: NumbersCommand, session: &Session) -> Result<()> {
    match cmd {
        NumbersCommand::Search { numbers } => {
            let numbers = parse_number_input(&numbers.join(","));
            let found = session.scope.run(session.client.number_info(&numbers)).await?;
            session.print(&found);
        }
        NumbersCommand::Linked { vn } => {
            let found = session.scope.run(session.client.linked_customers(&vn)).await?;
            session.print(&found);
        }
    }
    Ok(())
}
