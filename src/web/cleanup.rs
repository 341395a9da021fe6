//! Cleanup scan and execution endpoints

use axum::{extract::State, Json};

use crate::api::types::{CleanupExecuteRequest, NumbersRequest};
use crate::cleanup::{self, CleanupFinding, CleanupReport};
use crate::core::error::Error;
use crate::fleet::FleetResults;
use crate::web::error::ApiResult;
use crate::web::server::AppState;

pub async fn api_cleanup_scan(
    State(state): State<AppState>,
    Json(body): Json<NumbersRequest>,
) -> ApiResult<Json<FleetResults<CleanupFinding>>> {
    Ok(Json(state.fleet.cleanup_scan(&body.numbers).await?))
}

/// Apply the tasks in order. Failures are reported per task, never as an
/// error response, so earlier writes stay visible to the caller.
pub async fn api_cleanup_execute(
    State(state): State<AppState>,
    Json(body): Json<CleanupExecuteRequest>,
) -> ApiResult<Json<CleanupReport>> {
    if body.tasks.is_empty() {
        return Err(Error::validation("No tasks provided for execution.").into());
    }
    let report = cleanup::execute(state.fleet.vos(), state.fleet.config(), &body.tasks).await;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::{plan, TaskStatus};
    use crate::testing::{config_for, spawn_admin, FakeVos};
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_scan_then_execute() {
        let fake = FakeVos::new()
            .with_mapping(json!({"name": "MG1", "calloutCallerPrefixes": "0912345678,111"}))
            .with_routing(json!({"name": "RG1", "rewriteRulesInCaller": "100:0912345678;222"}))
            .rejecting("RG1");
        let server = fake.clone().spawn("S1").await;
        let base = spawn_admin(config_for(vec![server])).await;
        let client = reqwest::Client::new();

        let found: FleetResults<CleanupFinding> = client
            .post(format!("{base}/cleanup/scan"))
            .json(&json!({"numbers": ["+84912345678"]}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(found.results.len(), 2);
        assert!(found.errors.is_empty());

        let tasks: Vec<_> = found.results.iter().map(plan).collect();
        let report: CleanupReport = client
            .post(format!("{base}/cleanup/execute"))
            .json(&json!({ "tasks": tasks }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.count(TaskStatus::Success), 1);
        assert_eq!(report.count(TaskStatus::Failed), 1);
        assert!(report.execution_log[0].starts_with("[SUCCESS] S1 - MG1"));
        assert_eq!(fake.mapping("MG1").unwrap()["calloutCallerPrefixes"], json!("111"));
    }

    #[tokio::test]
    async fn test_execute_requires_tasks() {
        let base = spawn_admin(config_for(vec![])).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/cleanup/execute"))
            .json(&json!({"tasks": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = reqwest::Client::new()
            .post(format!("{base}/cleanup/scan"))
            .json(&json!({"numbers": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
