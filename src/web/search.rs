//! Fleet-wide searches over rewrite rules and numbers

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};

use crate::api::types::{KeySearchQuery, NumbersRequest, VirtualNumberQuery, VirtualNumberStatusResponse};
use crate::fleet::{FleetResults, LinkedCustomer, NumberFinding, RuleDefinition};
use crate::web::error::ApiResult;
use crate::web::server::AppState;

/// Values of every `keys` parameter, in order. Accepts `keys=a&keys=b`.
fn repeated_param(raw: Option<&str>, name: &str) -> Vec<String> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .collect()
    })
    .unwrap_or_default()
}

pub async fn api_rewrite_search(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<FleetResults<RuleDefinition>>> {
    let keys = repeated_param(query.as_deref(), "keys");
    Ok(Json(state.fleet.find_rule_definitions(&keys).await?))
}

pub async fn api_rewrite_keys(
    State(state): State<AppState>,
    Query(query): Query<KeySearchQuery>,
) -> ApiResult<Json<FleetResults<RuleDefinition>>> {
    Ok(Json(state.fleet.find_rule_keys(&query.term).await?))
}

pub async fn api_virtual_number_status(
    State(state): State<AppState>,
    Query(query): Query<VirtualNumberQuery>,
) -> ApiResult<Json<VirtualNumberStatusResponse>> {
    let definition = state
        .fleet
        .virtual_number_status(&query.server_name, &query.rg_name, &query.vn)
        .await?;
    Ok(Json(VirtualNumberStatusResponse {
        found: true,
        definition,
    }))
}

pub async fn api_linked_customers(
    State(state): State<AppState>,
    Path(vn): Path<String>,
) -> ApiResult<Json<FleetResults<LinkedCustomer>>> {
    Ok(Json(state.fleet.customers_linked_to_virtual_number(&vn).await?))
}

pub async fn api_number_info(
    State(state): State<AppState>,
    Json(body): Json<NumbersRequest>,
) -> ApiResult<Json<FleetResults<NumberFinding>>> {
    Ok(Json(state.fleet.number_info(&body.numbers).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ErrorBody;
    use crate::testing::{config_for, spawn_admin, FakeVos};
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_repeated_param() {
        let keys = repeated_param(Some("keys=190012&other=1&keys=%2B84"), "keys");
        assert_eq!(keys, vec!["190012", "+84"]);
        assert!(repeated_param(None, "keys").is_empty());
    }

    async fn base() -> String {
        let server = FakeVos::new()
            .with_customer(json!({"account": "KH001", "name": "Acme"}))
            .with_mapping(json!({
                "name": "MG1",
                "account": "KH001",
                "accountName": "Acme",
                "calloutCallerPrefixes": "190012"
            }))
            .with_routing(json!({"name": "RG1", "rewriteRulesInCaller": "190012:0912345678;0987654321"}))
            .spawn("S1")
            .await;
        spawn_admin(config_for(vec![server])).await
    }

    #[tokio::test]
    async fn test_rule_searches() {
        let base = base().await;
        let client = reqwest::Client::new();

        let found: FleetResults<RuleDefinition> = client
            .get(format!("{base}/rewrite-rules/search?keys=190012&keys=999"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(found.results.len(), 1);
        assert_eq!(found.results[0].real_numbers_count, 2);

        let missing = client
            .get(format!("{base}/rewrite-rules/search"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let keys: FleetResults<RuleDefinition> = client
            .get(format!("{base}/rewrite-rules/keys"))
            .query(&[("term", "9001")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(keys.results[0].virtual_key, "190012");
    }

    #[tokio::test]
    async fn test_virtual_number_status_and_links() {
        let base = base().await;
        let client = reqwest::Client::new();

        let status: VirtualNumberStatusResponse = client
            .get(format!("{base}/status/virtual-number"))
            .query(&[("server_name", "S1"), ("rg_name", "RG1"), ("vn", "190012")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(status.found);
        assert_eq!(status.definition.real_numbers_count, 2);

        let absent = client
            .get(format!("{base}/status/virtual-number"))
            .query(&[("server_name", "S1"), ("rg_name", "RG1"), ("vn", "1")])
            .send()
            .await
            .unwrap();
        assert_eq!(absent.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = absent.json().await.unwrap();
        assert!(body.detail.contains("not found"));

        let linked: FleetResults<LinkedCustomer> = client
            .get(format!("{base}/virtual-numbers/190012/customers"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(linked.results.len(), 1);
        assert_eq!(linked.results[0].linked_via_mg_name, "MG1");
    }

    #[tokio::test]
    async fn test_number_info() {
        let base = base().await;
        let found: FleetResults<NumberFinding> = reqwest::Client::new()
            .post(format!("{base}/search/number-info"))
            .json(&json!({"numbers": ["84912345678"]}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(found
            .results
            .iter()
            .any(|f| f.gateway_name == "RG1" && f.rewrite_key.as_deref() == Some("190012")));
    }
}
