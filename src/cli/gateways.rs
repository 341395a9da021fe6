//! Mapping and Routing Gateway commands

use clap::Subcommand;

use crate::cli::Session;
use crate::core::error::{Error, Result};
use crate::rules::{backup_key, parse_number_input, reconcile, replace_reals, PrefixAction, ReplaceMode};
use crate::vos::record::{
    lock, GatewayKind, GatewayRecord, CALLOUT_CALLEE_PREFIXES, CALLOUT_CALLER_PREFIXES,
};

#[derive(Subcommand, Debug)]
pub enum GatewayCommand {
    /// List gateways on a server, optionally filtered by name
    List {
        server: String,

        /// Case-insensitive part of the gateway name
        filter: Option<String>,
    },

    /// Show every field of one gateway
    Show { server: String, name: String },

    /// Add or delete caller (or callee) prefixes
    #[command(after_help = "EXAMPLES:
    vosadmin mg prefixes S1 MG1 0912345678 0987654321      Add two prefixes
    vosadmin mg prefixes S1 MG1 0912345678 --delete        Remove one
    vosadmin rg prefixes S1 RG1 1900 --callee              Add a callee prefix

Numbers may also be given as one comma- or newline-separated argument.")]
    Prefixes {
        server: String,
        name: String,

        /// Numbers to add or delete
        #[arg(required = true)]
        numbers: Vec<String>,

        /// Delete instead of add
        #[arg(long)]
        delete: bool,

        /// Edit the callee prefix list instead of the caller one
        #[arg(long)]
        callee: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoutingCommand {
    #[command(flatten)]
    Common(GatewayCommand),

    /// Append real numbers to a virtual key
    #[command(after_help = "EXAMPLES:
    vosadmin rg add-reals S1 RG1 190012 0912345678 +84987654321")]
    AddReals {
        server: String,
        rg: String,
        key: String,

        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Copy real numbers into a virtual key from another key (default: its backup)
    #[command(after_help = "EXAMPLES:
    vosadmin rg replace-reals S1 RG1 190012                  Merge from 190012bk
    vosadmin rg replace-reals S1 RG1 190012 --overwrite      Replace with 190012bk
    vosadmin rg replace-reals S1 RG1 190012 --from 190099 --limit 2")]
    ReplaceReals {
        server: String,
        rg: String,
        key: String,

        /// Source key (default: the key followed by `bk`)
        #[arg(long)]
        from: Option<String>,

        /// Take at most this many source numbers
        #[arg(long)]
        limit: Option<usize>,

        /// Discard the key's current numbers
        #[arg(long)]
        overwrite: bool,
    },
}

pub async fn run_mapping(cmd: GatewayCommand, session: &Session) -> Result<()> {
    run_common(cmd, GatewayKind::Mapping, session).await
}

pub async fn run_routing(cmd: RoutingCommand, session: &Session) -> Result<()> {
    match cmd {
        RoutingCommand::Common(cmd) => run_common(cmd, GatewayKind::Routing, session).await,
        RoutingCommand::AddReals {
            server,
            rg,
            key,
            numbers,
        } => {
            let ctx = session.server(&server).await?;
            let numbers = parse_number_input(&numbers.join(","));
            let message = session
                .scope
                .run(ctx.add_reals(&rg, &key, numbers, None))
                .await?;
            session.done(message);
            Ok(())
        }
        RoutingCommand::ReplaceReals {
            server,
            rg,
            key,
            from,
            limit,
            overwrite,
        } => {
            let ctx = session.server(&server).await?;
            let details = session.scope.run(ctx.gateway(GatewayKind::Routing, &rg)).await?;
            let rules = details.record.rewrite_rules();

            let source_key = from.unwrap_or_else(|| backup_key(&key));
            let source = rules.get(&source_key).ok_or_else(|| {
                Error::not_found(format!("Source key '{}' not found in RG '{}'.", source_key, rg))
            })?;
            let mode = if overwrite {
                ReplaceMode::Overwrite
            } else {
                ReplaceMode::Merge
            };
            let target = replace_reals(rules.get(&key), source, limit.unwrap_or(usize::MAX), mode);
            let new_reals = target.map(|t| t.to_list()).unwrap_or_default();

            let message = session
                .scope
                .run(ctx.replace_reals(&rg, &key, new_reals, Some(details.hash)))
                .await?;
            session.done(message);
            Ok(())
        }
    }
}

async fn run_common(cmd: GatewayCommand, kind: GatewayKind, session: &Session) -> Result<()> {
    match cmd {
        GatewayCommand::List { server, filter } => {
            let ctx = session.server(&server).await?;
            let filter = filter.unwrap_or_default();
            let found = session.scope.run(ctx.gateways(kind, &filter)).await?;
            session.print(&found);
        }
        GatewayCommand::Show { server, name } => {
            let ctx = session.server(&server).await?;
            let details = session.scope.run(ctx.gateway(kind, &name)).await?;
            session.print(&details);
        }
        GatewayCommand::Prefixes {
            server,
            name,
            numbers,
            delete,
            callee,
        } => {
            let ctx = session.server(&server).await?;
            let details = session.scope.run(ctx.gateway(kind, &name)).await?;

            let field = if callee {
                kind.callee_prefix_field()
            } else {
                kind.caller_prefix_field()
            };
            let action = if delete {
                PrefixAction::Delete
            } else {
                PrefixAction::Add
            };
            let inputs = parse_number_input(&numbers.join(","));
            let result = reconcile(details.record.str_field(field), &inputs, action);
            if !result.changed {
                session.done(format!("No changes to {} of {} '{}'.", field, kind.label(), name));
                return Ok(());
            }

            let payload = prefix_payload(kind, &details.record, field, action, &result.csv);
            let message = session
                .scope
                .run(ctx.update_gateway(kind, &name, payload, Some(details.hash)))
                .await?;
            session.done(format!(
                "{} Added {}, removed {}.",
                message,
                result.added.len(),
                result.removed.len()
            ));
        }
    }
    Ok(())
}

/// Record to write after a prefix edit. A Mapping Gateway whose delete
/// leaves both callout prefix lists empty is auto-locked.
fn prefix_payload(
    kind: GatewayKind,
    record: &GatewayRecord,
    field: &str,
    action: PrefixAction,
    csv: &str,
) -> GatewayRecord {
    let mut payload = record.clone();
    payload.set_str(field, csv);
    if kind == GatewayKind::Mapping
        && action == PrefixAction::Delete
        && payload.prefixes(CALLOUT_CALLER_PREFIXES).is_empty()
        && payload.prefixes(CALLOUT_CALLEE_PREFIXES).is_empty()
    {
        payload.set_lock_type(lock::AUTO_LOCKED_EMPTY);
    }
    payload
}
