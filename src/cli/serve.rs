//! Serve command implementation
//!
//! Runs the control-plane API in the foreground.

use clap::Args;

use crate::core::config::Config;
use crate::core::error::{Error, Result};

/// Arguments for the serve command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    vosadmin serve                        Listen on the configured address
    vosadmin serve --bind 0.0.0.0:8000    Listen on all interfaces")]
pub struct ServeArgs {
    /// Address to listen on (default: http.bind from config)
    #[arg(long)]
    pub bind: Option<String>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(bind) = args.bind {
        config.http.bind = bind;
    }
    if config.servers.is_empty() {
        return Err(Error::ConfigError {
            message: "No servers configured. Add [[servers]] entries to config.toml.".to_string(),
        });
    }
    crate::web::run(config).await
}
