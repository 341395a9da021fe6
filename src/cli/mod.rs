//! CLI command definitions and handlers

pub mod cleanup;
pub mod customers;
pub mod gateways;
pub mod numbers;
pub mod rules;
pub mod serve;
pub mod servers;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::api::{AdminClient, ServerContext, ServerDirectory, ViewScope};
use crate::api::state::LoadStatus;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::output::{self, Human};

const LONG_ABOUT: &str = r#"
Operator console for a fleet of VOS3000 softswitch servers.

`vosadmin serve` runs the control-plane API next to the VOS3000 servers listed
in config.toml. Every other command talks to that API.

QUICK START:
    1. List servers in ~/.local/share/vosadmin/config.toml (or $VOSADMIN_HOME)
    2. vosadmin serve                 Start the control-plane API
    3. vosadmin servers               Check which servers it knows about

CUSTOMERS:
    vosadmin customers search KH0     Find accounts on every server
    vosadmin customers credit S1 KH001 500 --mode add

GATEWAYS:
    vosadmin mg list S1               Mapping Gateways on S1
    vosadmin rg add-reals S1 RG1 190012 0912345678

NUMBERS:
    vosadmin numbers search 0912345678    Where is this number configured?
    vosadmin cleanup run 0912345678       Remove it everywhere (asks first)

Add --json to any command for machine-readable output.
"#;

/// VOS3000 fleet administration
#[derive(Parser, Debug)]
#[command(name = "vosadmin")]
#[command(author, version)]
#[command(about = "VOS3000 fleet administration")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: $VOSADMIN_HOME/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control-plane API
    Serve(serve::ServeArgs),

    /// List the servers the control plane manages
    Servers,

    /// Customer accounts
    #[command(subcommand)]
    Customers(customers::CustomersCommand),

    /// Mapping Gateways
    #[command(subcommand)]
    Mg(gateways::GatewayCommand),

    /// Routing Gateways and their rewrite rules
    #[command(subcommand)]
    Rg(gateways::RoutingCommand),

    /// Rewrite-rule lookups across the fleet
    #[command(subcommand)]
    Rules(rules::RulesCommand),

    /// Where numbers are configured
    #[command(subcommand)]
    Numbers(numbers::NumbersCommand),

    /// Remove numbers from every gateway
    #[command(subcommand)]
    Cleanup(cleanup::CleanupCommand),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

/// What every API-backed command works with
pub struct Session {
    pub client: AdminClient,
    pub directory: ServerDirectory,
    pub scope: ViewScope,
    pub format: OutputFormat,
}

impl Session {
    pub fn new(config: &Config, format: OutputFormat) -> Result<Self> {
        Ok(Self {
            client: AdminClient::new(&config.client)?,
            directory: ServerDirectory::new(),
            scope: ViewScope::new(),
            format,
        })
    }

    /// Context for a server name, checked against the control plane's list
    pub async fn server(&self, name: &str) -> Result<ServerContext> {
        if self.directory.status() != LoadStatus::Ready {
            self.scope.run(self.directory.refresh(&self.client)).await?;
        }
        self.directory.select(&self.client, name)
    }

    pub fn print<T: Serialize + Human + ?Sized>(&self, value: &T) {
        println!("{}", output::format(value, self.format).trim_end());
    }

    /// Print a confirmation message from a write
    pub fn done(&self, message: String) {
        self.print(&crate::api::types::MessageResponse::new(message));
    }
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let format = cli.output_format();

    match cli.command {
        Commands::Serve(args) => serve::run(args, config).await,
        command => run_client(command, &config, format).await,
    }
}

async fn run_client(command: Commands, config: &Config, format: OutputFormat) -> Result<()> {
    let session = Session::new(config, format)?;
    debug!(base_url = session.client.base_url(), "Using control plane");

    // Ctrl-C abandons whatever request is in flight
    let scope = session.scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            scope.close();
        }
    });

    match command {
        Commands::Serve(_) => Ok(()),
        Commands::Servers => servers::run(&session).await,
        Commands::Customers(cmd) => customers::run(cmd, &session).await,
        Commands::Mg(cmd) => gateways::run_mapping(cmd, &session).await,
        Commands::Rg(cmd) => gateways::run_routing(cmd, &session).await,
        Commands::Rules(cmd) => rules::run(cmd, &session).await,
        Commands::Numbers(cmd) => numbers::run(cmd, &session).await,
        Commands::Cleanup(cmd) => cleanup::run(cmd, &session).await,
    }
}

/// One-line explanation of a failed command
pub fn describe_error(err: &Error) -> String {
    match err {
        Error::Conflict { message, .. } => format!(
            "{} The record changed since it was read; reload and retry.",
            message
        ),
        Error::Cancelled => "Cancelled.".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_anywhere() {
        let cli = Cli::try_parse_from(["vosadmin", "mg", "list", "S1", "--json"]).unwrap();
        assert_eq!(cli.output_format(), OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Mg(_)));

        let cli = Cli::try_parse_from(["vosadmin", "--config", "/tmp/x.toml", "servers"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert_eq!(cli.output_format(), OutputFormat::Human);
    }

    #[test]
    fn test_conflict_tells_operator_to_reload() {
        let err = Error::conflict("The data has been modified by another user.", None);
        assert!(describe_error(&err).contains("reload and retry"));
        assert_eq!(describe_error(&Error::Cancelled), "Cancelled.");
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
