//! Cleanup commands
//!
//! `scan` only reports. `run` scans, lets the operator pick findings, then
//! executes one corrected write per picked gateway.

use clap::Subcommand;
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};

use crate::cleanup::{plan, CleanupFinding, CleanupTask, TaskStatus};
use crate::cli::Session;
use crate::core::error::{Error, Result};
use crate::rules::parse_number_input;

#[derive(Subcommand, Debug)]
pub enum CleanupCommand {
    /// Report every gateway that references the numbers
    Scan {
        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Remove the numbers from every gateway that references them
    #[command(after_help = "EXAMPLES:
    vosadmin cleanup run 0912345678            Pick gateways, confirm, execute
    vosadmin cleanup run 0912345678 --yes      Clean every finding without asking

Writes are applied one gateway at a time and are not rolled back if a later
one fails. Gateways left with no prefixes at all are locked.")]
    Run {
        #[arg(required = true)]
        numbers: Vec<String>,

        /// Clean every finding without prompting
        #[arg(long, short)]
        yes: bool,
    },
}

fn finding_label(finding: &CleanupFinding) -> String {
    format!(
        "[{}] {} {} ({} match(es))",
        finding.server_name(),
        finding.kind().short(),
        finding.name(),
        finding.match_count()
    )
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Prompt {
        message: e.to_string(),
    }
}

/// Let the operator choose which findings to clean; all are preselected
fn pick(findings: &[CleanupFinding]) -> Result<Vec<CleanupTask>> {
    let labels: Vec<String> = findings.iter().map(finding_label).collect();
    let defaults = vec![true; labels.len()];
    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Gateways to clean (space toggles, enter confirms)")
        .items(&labels)
        .defaults(&defaults)
        .interact()
        .map_err(prompt_error)?;
    if chosen.is_empty() {
        return Ok(Vec::new());
    }

    let proceed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Write {} gateway(s)? This cannot be undone", chosen.len()))
        .default(false)
        .interact()
        .map_err(prompt_error)?;
    if !proceed {
        return Ok(Vec::new());
    }
    Ok(chosen.into_iter().map(|i| plan(&findings[i])).collect())
}

pub async fn run(cmd: CleanupCommand, session: &Session) -> Result<()> {
    match cmd {
        CleanupCommand::Scan { numbers } => {
            let numbers = parse_number_input(&numbers.join(","));
            let found = session.scope.run(session.client.cleanup_scan(&numbers)).await?;
            session.print(&found);
            Ok(())
        }
        CleanupCommand::Run { numbers, yes } => {
            let numbers = parse_number_input(&numbers.join(","));
            let found = session.scope.run(session.client.cleanup_scan(&numbers)).await?;
            session.print(&found);
            if found.results.is_empty() {
                return Ok(());
            }

            let tasks = if yes {
                found.results.iter().map(plan).collect()
            } else {
                pick(&found.results)?
            };
            if tasks.is_empty() {
                session.done("Nothing cleaned.".to_string());
                return Ok(());
            }

            let report = session.scope.run(session.client.cleanup_execute(tasks)).await?;
            session.print(&report);

            let failed = report.count(TaskStatus::Failed);
            if failed > 0 {
                return Err(Error::rejected(format!("{} cleanup task(s) failed.", failed)));
            }
            Ok(())
        }
    }
}
