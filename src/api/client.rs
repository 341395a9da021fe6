//! Typed client for the control-plane REST API
//!
//! Error responses are turned back into [`Error`] variants, so callers can
//! match on [`Error::Conflict`] instead of inspecting message text.

use crate::api::state::ServerContext;
use crate::api::types::{
    CleanupExecuteRequest, ErrorBody, HealthResponse, NumbersRequest, ServerEntry,
};
use crate::cleanup::{CleanupFinding, CleanupReport, CleanupTask};
use crate::core::config::ClientConfig;
use crate::core::error::{Error, Result, CONFLICT_MARKER};
use crate::fleet::{CustomerFilter, FleetResults, LinkedCustomer, NumberFinding, RuleDefinition};
use crate::vos::customers::CustomerSummary;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    base_url: String,
}

impl AdminClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-server calls for `server_name`
    pub fn server(&self, server_name: &str) -> ServerContext {
        ServerContext::new(self.clone(), server_name)
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let res = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        decode(res).await
    }

    pub(crate) async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, %method, "Sending");
        let res = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        decode(res).await
    }

    // =========================================================================
    // FLEET-WIDE CALLS
    // =========================================================================

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health", &[]).await
    }

    pub async fn servers(&self) -> Result<Vec<ServerEntry>> {
        self.get("/servers", &[]).await
    }

    pub async fn search_customers(
        &self,
        filter: CustomerFilter,
        text: &str,
    ) -> Result<FleetResults<CustomerSummary>> {
        let filter = filter.to_string();
        self.get(
            "/customers/search",
            &[("filter_type", filter.as_str()), ("filter_text", text)],
        )
        .await
    }

    pub async fn find_rule_definitions(&self, keys: &[String]) -> Result<FleetResults<RuleDefinition>> {
        let query: Vec<(&str, &str)> = keys.iter().map(|k| ("keys", k.as_str())).collect();
        self.get("/rewrite-rules/search", &query).await
    }

    pub async fn find_rule_keys(&self, term: &str) -> Result<FleetResults<RuleDefinition>> {
        self.get("/rewrite-rules/keys", &[("term", term)]).await
    }

    pub async fn linked_customers(&self, vn: &str) -> Result<FleetResults<LinkedCustomer>> {
        let path = format!("/virtual-numbers/{}/customers", urlencoding::encode(vn));
        self.get(&path, &[]).await
    }

    pub async fn number_info(&self, numbers: &[String]) -> Result<FleetResults<NumberFinding>> {
        let body = NumbersRequest {
            numbers: numbers.to_vec(),
        };
        self.send(Method::POST, "/search/number-info", &body).await
    }

    pub async fn cleanup_scan(&self, numbers: &[String]) -> Result<FleetResults<CleanupFinding>> {
        let body = NumbersRequest {
            numbers: numbers.to_vec(),
        };
        self.send(Method::POST, "/cleanup/scan", &body).await
    }

    pub async fn cleanup_execute(&self, tasks: Vec<CleanupTask>) -> Result<CleanupReport> {
        let body = CleanupExecuteRequest { tasks };
        self.send(Method::POST, "/cleanup/execute", &body).await
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> Error {
    let message = if e.is_connect() {
        format!("Cannot connect to the vosadmin API at {}", url)
    } else if e.is_timeout() {
        format!("Request to {} timed out", url)
    } else {
        format!("Request to {} failed: {}", url, e)
    };
    Error::Transport { message }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    if status.is_success() {
        return res.json().await.map_err(|e| Error::Transport {
            message: format!("Invalid response body: {}", e),
        });
    }

    let text = res.text().await.unwrap_or_default();
    Err(error_from_response(status.as_u16(), &text))
}

/// Rebuild a typed error from a non-2xx status and body
pub(crate) fn error_from_response(status: u16, text: &str) -> Error {
    let body: Option<ErrorBody> = serde_json::from_str(text).ok();
    let (detail, current_hash) = match body {
        Some(body) => (body.detail, body.current_hash),
        None => (text.trim().to_string(), None),
    };

    if status == 409 || detail.contains(CONFLICT_MARKER) {
        let message = detail
            .strip_prefix(CONFLICT_MARKER)
            .map(|rest| rest.trim_start_matches(':').trim())
            .unwrap_or(detail.as_str())
            .to_string();
        return Error::Conflict {
            message,
            current_hash,
        };
    }

    match status {
        404 => Error::NotFound { message: detail },
        400 => Error::Rejected { message: detail },
        _ => Error::Backend { status, detail },
    }
}
