//! Operator-side state: the selected server, the server list and view scopes

use crate::api::client::AdminClient;
use crate::api::types::{
    gateway_segment, CreditLimitUpdate, GatewayDetails, GatewayUpdate, LockStatusUpdate,
    MessageResponse, RealsUpdate, VirtualNumberStatusResponse,
};
use crate::core::error::{Error, Result};
use crate::credit::CreditLimit;
use crate::vos::customers::{CustomerDetails, LockStatus};
use crate::vos::record::{GatewayKind, GatewayRecord};
use parking_lot::RwLock;
use reqwest::Method;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// =============================================================================
// SERVER CONTEXT
// =============================================================================

/// Calls scoped to one selected server
#[derive(Clone)]
pub struct ServerContext {
    client: AdminClient,
    server_name: String,
}

impl ServerContext {
    pub fn new(client: AdminClient, server_name: &str) -> Self {
        Self {
            client,
            server_name: server_name.to_string(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    fn path(&self, rest: &str) -> String {
        format!("/servers/{}{}", urlencoding::encode(&self.server_name), rest)
    }

    fn gateway_path(&self, kind: GatewayKind, name: &str) -> String {
        self.path(&format!(
            "/{}/{}",
            gateway_segment(kind),
            urlencoding::encode(name)
        ))
    }

    fn rule_path(&self, rg_name: &str, virtual_key: &str) -> String {
        self.path(&format!(
            "/routing-gateways/{}/rules/{}/reals",
            urlencoding::encode(rg_name),
            urlencoding::encode(virtual_key)
        ))
    }

    pub async fn customer(&self, account: &str) -> Result<CustomerDetails> {
        let path = self.path(&format!("/customers/{}", urlencoding::encode(account)));
        self.client.get(&path, &[]).await
    }

    pub async fn set_credit_limit(
        &self,
        account: &str,
        new_limit: CreditLimit,
        initial_hash: Option<String>,
    ) -> Result<String> {
        let path = self.path(&format!(
            "/customers/{}/credit-limit",
            urlencoding::encode(account)
        ));
        let body = CreditLimitUpdate {
            new_limit,
            initial_hash,
        };
        let reply: MessageResponse = self.client.send(Method::PUT, &path, &body).await?;
        Ok(reply.message)
    }

    pub async fn set_lock_status(
        &self,
        account: &str,
        new_lock_status: LockStatus,
        initial_hash: Option<String>,
    ) -> Result<String> {
        let path = self.path(&format!(
            "/customers/{}/lock-status",
            urlencoding::encode(account)
        ));
        let body = LockStatusUpdate {
            new_lock_status,
            initial_hash,
        };
        let reply: MessageResponse = self.client.send(Method::PUT, &path, &body).await?;
        Ok(reply.message)
    }

    pub async fn gateways(&self, kind: GatewayKind, filter_text: &str) -> Result<Vec<GatewayDetails>> {
        let path = self.path(&format!("/{}", gateway_segment(kind)));
        self.client.get(&path, &[("filter_text", filter_text)]).await
    }

    pub async fn gateway(&self, kind: GatewayKind, name: &str) -> Result<GatewayDetails> {
        self.client.get(&self.gateway_path(kind, name), &[]).await
    }

    pub async fn update_gateway(
        &self,
        kind: GatewayKind,
        name: &str,
        payload: GatewayRecord,
        initial_hash: Option<String>,
    ) -> Result<String> {
        let body = GatewayUpdate {
            payload_update_data: payload,
            initial_hash,
        };
        let reply: MessageResponse = self
            .client
            .send(Method::PUT, &self.gateway_path(kind, name), &body)
            .await?;
        Ok(reply.message)
    }

    pub async fn add_reals(
        &self,
        rg_name: &str,
        virtual_key: &str,
        new_reals: Vec<String>,
        initial_hash: Option<String>,
    ) -> Result<String> {
        let body = RealsUpdate {
            new_reals,
            initial_hash,
        };
        let reply: MessageResponse = self
            .client
            .send(Method::POST, &self.rule_path(rg_name, virtual_key), &body)
            .await?;
        Ok(reply.message)
    }

    /// Replace a key's real numbers; `["hetso"]` blocks it, empty deletes it
    pub async fn replace_reals(
        &self,
        rg_name: &str,
        virtual_key: &str,
        new_reals: Vec<String>,
        initial_hash: Option<String>,
    ) -> Result<String> {
        let body = RealsUpdate {
            new_reals,
            initial_hash,
        };
        let reply: MessageResponse = self
            .client
            .send(Method::PUT, &self.rule_path(rg_name, virtual_key), &body)
            .await?;
        Ok(reply.message)
    }

    pub async fn virtual_number_status(
        &self,
        rg_name: &str,
        vn: &str,
    ) -> Result<VirtualNumberStatusResponse> {
        self.client
            .get(
                "/status/virtual-number",
                &[
                    ("server_name", self.server_name.as_str()),
                    ("rg_name", rg_name),
                    ("vn", vn),
                ],
            )
            .await
    }
}

// =============================================================================
// SERVER DIRECTORY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Default)]
struct DirectoryState {
    status: LoadStatus,
    servers: Vec<String>,
}

/// Server names known to the control plane, fetched on demand
#[derive(Clone, Default)]
pub struct ServerDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl ServerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LoadStatus {
        self.state.read().status.clone()
    }

    pub fn servers(&self) -> Vec<String> {
        self.state.read().servers.clone()
    }

    /// Fetch the server list. A failed refresh keeps the previous names.
    pub async fn refresh(&self, client: &AdminClient) -> Result<Vec<String>> {
        self.state.write().status = LoadStatus::Loading;

        match client.servers().await {
            Ok(entries) => {
                let names: Vec<String> = entries.into_iter().map(|e| e.name).collect();
                let mut state = self.state.write();
                state.servers = names.clone();
                state.status = LoadStatus::Ready;
                debug!(count = names.len(), "Server list loaded");
                Ok(names)
            }
            Err(e) => {
                warn!("Failed to load server list: {}", e);
                self.state.write().status = LoadStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Context for `name`, checked against the loaded list once it is ready
    pub fn select(&self, client: &AdminClient, name: &str) -> Result<ServerContext> {
        let state = self.state.read();
        if state.status == LoadStatus::Ready && !state.servers.iter().any(|s| s == name) {
            return Err(Error::ServerNotFound {
                name: name.to_string(),
            });
        }
        Ok(client.server(name))
    }
}

// =============================================================================
// VIEW SCOPE
// =============================================================================

/// Lifetime of one view's requests.
///
/// Closing the scope makes every pending and future [`ViewScope::run`] resolve
/// to [`Error::Cancelled`], so results for a view the operator left are
/// never applied.
#[derive(Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Close this scope and start a new one for the next view
    pub fn renew(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
    }

    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_closed() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_for, config_for, spawn_admin, FakeVos};
    use serde_json::json;
    use std::time::Duration;

    async fn setup() -> (FakeVos, AdminClient) {
        let fake = FakeVos::new()
            .with_customer(json!({"account": "KH 1", "name": "Acme", "limitMoney": 10}))
            .with_mapping(json!({"name": "MG1", "calloutCallerPrefixes": "111"}))
            .with_routing(json!({"name": "RG1", "rewriteRulesInCaller": "100:111"}));
        let server = fake.clone().spawn("S1").await;
        let base = spawn_admin(config_for(vec![server])).await;
        (fake, client_for(&base))
    }

    #[tokio::test]
    async fn test_customer_round_trip_with_conflict() {
        let (fake, client) = setup().await;
        let ctx = client.server("S1");

        let details = ctx.customer("KH 1").await.unwrap();
        let message = ctx
            .set_credit_limit("KH 1", CreditLimit::Limited(500), Some(details.hash.clone()))
            .await
            .unwrap();
        assert_eq!(message, "Successfully updated credit limit.");

        let err = ctx
            .set_lock_status("KH 1", LockStatus::Locked, Some(details.hash))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(fake.customer("KH 1").unwrap()["limitMoney"], json!("500"));
    }

    #[tokio::test]
    async fn test_gateway_calls() {
        let (fake, client) = setup().await;
        let ctx = client.server("S1");

        let list = ctx.gateways(GatewayKind::Mapping, "").await.unwrap();
        assert_eq!(list.len(), 1);

        let mg = ctx.gateway(GatewayKind::Mapping, "MG1").await.unwrap();
        let mut payload = mg.record.clone();
        payload.set_str("calloutCallerPrefixes", "111,222");
        ctx.update_gateway(GatewayKind::Mapping, "MG1", payload, Some(mg.hash))
            .await
            .unwrap();
        assert_eq!(fake.mapping("MG1").unwrap()["calloutCallerPrefixes"], json!("111,222"));

        ctx.add_reals("RG1", "100", vec!["222".to_string()], None)
            .await
            .unwrap();
        let status = ctx.virtual_number_status("RG1", "100").await.unwrap();
        assert_eq!(status.definition.real_numbers_count, 2);

        ctx.replace_reals("RG1", "100", Vec::new(), None).await.unwrap();
        let err = ctx.virtual_number_status("RG1", "100").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let err = client.server("S9").gateway(GatewayKind::Routing, "RG1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_directory_load_and_select() {
        let (_fake, client) = setup().await;
        let directory = ServerDirectory::new();
        assert_eq!(directory.status(), LoadStatus::Idle);
        // nothing loaded yet, so any name is accepted
        assert!(directory.select(&client, "S9").is_ok());

        let names = directory.refresh(&client).await.unwrap();
        assert_eq!(names, vec!["S1"]);
        assert_eq!(directory.status(), LoadStatus::Ready);
        assert_eq!(directory.select(&client, "S1").unwrap().server_name(), "S1");
        assert!(matches!(
            directory.select(&client, "S9"),
            Err(Error::ServerNotFound { .. })
        ));

        let offline = client_for("http://127.0.0.1:9");
        assert!(directory.refresh(&offline).await.is_err());
        assert!(matches!(directory.status(), LoadStatus::Failed(_)));
        assert_eq!(directory.servers(), vec!["S1"]);
    }

    #[tokio::test]
    async fn test_view_scope_cancels_pending_and_later_work() {
        let mut scope = ViewScope::new();
        assert_eq!(scope.run(async { Ok(1) }).await.unwrap(), 1);

        let pending = scope.clone();
        let handle = tokio::spawn(async move {
            pending
                .run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(2)
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        scope.renew();

        assert!(matches!(handle.await.unwrap(), Err(Error::Cancelled)));
        // the renewed scope runs normally
        assert_eq!(scope.run(async { Ok(3) }).await.unwrap(), 3);

        scope.close();
        assert!(scope.is_closed());
        assert!(matches!(scope.run(async { Ok(4) }).await, Err(Error::Cancelled)));
    }
}
