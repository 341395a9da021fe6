//! Customer commands

use clap::Subcommand;

use crate::cli::Session;
use crate::core::error::{Error, Result};
use crate::credit::{self, AdjustMode, CreditLimit};
use crate::fleet::CustomerFilter;
use crate::vos::customers::LockStatus;

#[derive(Subcommand, Debug)]
pub enum CustomersCommand {
    /// Find customers on every server by account id (or name)
    #[command(after_help = "EXAMPLES:
    vosadmin customers search KH0            Accounts containing KH0
    vosadmin customers search acme --name    Customers named like acme")]
    Search {
        /// Text to look for, case-insensitive
        text: String,

        /// Match the customer name instead of the account id
        #[arg(long)]
        name: bool,
    },

    /// Show one customer
    Show { server: String, account: String },

    /// Set or adjust a credit limit
    #[command(after_help = "EXAMPLES:
    vosadmin customers credit S1 KH001 500               Set the limit to 500
    vosadmin customers credit S1 KH001 unlimited         Remove the limit
    vosadmin customers credit S1 KH001 100 --mode add    Raise it by 100")]
    Credit {
        server: String,
        account: String,

        /// New limit, `unlimited`/`-1`, or an amount for add/subtract
        amount: String,

        /// set, add or subtract
        #[arg(long, default_value = "set", value_parser = parse_mode)]
        mode: AdjustMode,
    },

    /// Lock an account
    Lock { server: String, account: String },

    /// Unlock an account
    Unlock { server: String, account: String },
}

fn parse_mode(s: &str) -> std::result::Result<AdjustMode, String> {
    match s.to_lowercase().as_str() {
        "set" => Ok(AdjustMode::Set),
        "add" | "increase" => Ok(AdjustMode::Add),
        "subtract" | "decrease" => Ok(AdjustMode::Subtract),
        other => Err(format!("unknown mode '{}' (use set, add or subtract)", other)),
    }
}

/// Work out the limit to write from the current one and the operator input
pub fn next_limit(current: Option<CreditLimit>, amount: &str, mode: AdjustMode) -> Result<CreditLimit> {
    if mode == AdjustMode::Set {
        if let Some(limit) = CreditLimit::parse(amount) {
            return Ok(limit);
        }
    }
    let amount: i64 = amount
        .trim()
        .parse()
        .map_err(|_| Error::validation(format!("'{}' is not a whole amount.", amount.trim())))?;
    let current = current.unwrap_or(CreditLimit::Limited(0));
    Ok(credit::apply(current, mode, amount)?)
}

pub async fn run(cmd: CustomersCommand, session: &Session) -> Result<()> {
    match cmd {
        CustomersCommand::Search { text, name } => {
            let filter = if name {
                CustomerFilter::AccountName
            } else {
                CustomerFilter::AccountId
            };
            let found = session
                .scope
                .run(session.client.search_customers(filter, &text))
                .await?;
            session.print(&found);
        }
        CustomersCommand::Show { server, account } => {
            let ctx = session.server(&server).await?;
            let details = session.scope.run(ctx.customer(&account)).await?;
            session.print(&details);
        }
        CustomersCommand::Credit {
            server,
            account,
            amount,
            mode,
        } => {
            let ctx = session.server(&server).await?;
            let details = session.scope.run(ctx.customer(&account)).await?;
            let limit = next_limit(details.limit_money, &amount, mode)?;
            let message = session
                .scope
                .run(ctx.set_credit_limit(&account, limit, Some(details.hash)))
                .await?;
            session.done(format!("{} New limit: {}.", message, limit));
        }
        CustomersCommand::Lock { server, account } => {
            set_lock(session, &server, &account, LockStatus::Locked).await?;
        }
        CustomersCommand::Unlock { server, account } => {
            set_lock(session, &server, &account, LockStatus::Active).await?;
        }
    }
    Ok(())
}

async fn set_lock(session: &Session, server: &str, account: &str, status: LockStatus) -> Result<()> {
    let ctx = session.server(server).await?;
    let details = session.scope.run(ctx.customer(account)).await?;
    if details.lock_type == Some(status) {
        session.done(format!("Account {} is already {}.", account, status));
        return Ok(());
    }
    let message = session
        .scope
        .run(ctx.set_lock_status(account, status, Some(details.hash)))
        .await?;
    session.done(message);
    Ok(())
}
