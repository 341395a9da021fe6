//! Applying a confirmed cleanup batch
//!
//! Tasks run one after another. There is no rollback: a failed task leaves
//! the ones before it applied, and the report says which gateways changed.

use crate::cleanup::plan::CleanupTask;
use crate::core::config::Config;
use crate::core::error::Error;
use crate::vos::client::VosClient;
use crate::vos::gateways;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub server_name: String,
    pub gateway_name: String,
    pub status: TaskStatus,
    pub message: String,
}

impl TaskOutcome {
    fn log_line(&self) -> String {
        let tag = match self.status {
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "SKIPPED",
        };
        format!("[{}] {} - {}: {}", tag, self.server_name, self.gateway_name, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub run_id: String,
    pub results: Vec<TaskOutcome>,
    pub execution_log: Vec<String>,
}

impl CleanupReport {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

pub async fn execute(vos: &VosClient, config: &Config, tasks: &[CleanupTask]) -> CleanupReport {
    let run_id = Uuid::new_v4().to_string();
    info!(run_id = %run_id, tasks = tasks.len(), "Executing cleanup batch");

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        let outcome = run_task(vos, config, task).await;
        if outcome.status == TaskStatus::Success {
            info!(run_id = %run_id, server = %task.server_name, gateway = %task.gateway_name, "Cleanup applied");
        } else {
            warn!(run_id = %run_id, server = %task.server_name, gateway = %task.gateway_name, "{}", outcome.message);
        }
        results.push(outcome);
    }

    let execution_log = results.iter().map(TaskOutcome::log_line).collect();
    CleanupReport {
        run_id,
        results,
        execution_log,
    }
}

async fn run_task(vos: &VosClient, config: &Config, task: &CleanupTask) -> TaskOutcome {
    let outcome = |status: TaskStatus, message: String| TaskOutcome {
        server_name: task.server_name.clone(),
        gateway_name: task.gateway_name.clone(),
        status,
        message,
    };

    if task.server_name.is_empty() || task.gateway_name.is_empty() || task.updated_payload.is_empty() {
        return outcome(TaskStatus::Skipped, "Invalid task.".to_string());
    }

    let server = match config.server(&task.server_name) {
        Ok(server) => server,
        Err(Error::ServerNotFound { .. }) => {
            return outcome(TaskStatus::Failed, "Server not found in config.".to_string())
        }
        Err(e) => return outcome(TaskStatus::Failed, e.to_string()),
    };

    match gateways::apply_cleanup(vos, server, task.kind, &task.gateway_name, &task.updated_payload).await {
        Ok(message) => outcome(TaskStatus::Success, message),
        Err(e) => outcome(TaskStatus::Failed, e.to_string()),
    }
}
