//! In-process VOS3000 stand-in for tests

use crate::core::config::{Config, ServerConfig};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Default)]
pub struct FakeVosData {
    pub customers: Vec<Map<String, Value>>,
    pub mappings: Vec<Map<String, Value>>,
    pub routings: Vec<Map<String, Value>>,
    /// Gateway or account names whose modify calls are rejected
    pub reject: HashSet<String>,
    /// Every modify call received, in order
    pub modifications: Vec<(String, Value)>,
}

#[derive(Clone, Default)]
pub struct FakeVos {
    pub data: Arc<Mutex<FakeVosData>>,
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl FakeVos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(self, customer: Value) -> Self {
        self.data.lock().customers.push(object(customer));
        self
    }

    pub fn with_mapping(self, gateway: Value) -> Self {
        self.data.lock().mappings.push(object(gateway));
        self
    }

    pub fn with_routing(self, gateway: Value) -> Self {
        self.data.lock().routings.push(object(gateway));
        self
    }

    pub fn rejecting(self, name: &str) -> Self {
        self.data.lock().reject.insert(name.to_string());
        self
    }

    pub fn mapping(&self, name: &str) -> Option<Map<String, Value>> {
        find(&self.data.lock().mappings, "name", name).cloned()
    }

    pub fn routing(&self, name: &str) -> Option<Map<String, Value>> {
        find(&self.data.lock().routings, "name", name).cloned()
    }

    pub fn customer(&self, account: &str) -> Option<Map<String, Value>> {
        find(&self.data.lock().customers, "account", account).cloned()
    }

    pub fn modification_count(&self) -> usize {
        self.data.lock().modifications.len()
    }

    /// Change a stored mapping field behind the caller's back
    pub fn touch_mapping(&self, name: &str, key: &str, value: Value) {
        let mut data = self.data.lock();
        if let Some(record) = data.mappings.iter_mut().find(|m| m.get("name") == Some(&json!(name))) {
            record.insert(key.to_string(), value);
        }
    }

    pub fn touch_customer(&self, account: &str, key: &str, value: Value) {
        let mut data = self.data.lock();
        if let Some(record) = data
            .customers
            .iter_mut()
            .find(|c| c.get("account") == Some(&json!(account)))
        {
            record.insert(key.to_string(), value);
        }
    }

    pub async fn spawn(self, name: &str) -> ServerConfig {
        let app = Router::new()
            .route("/external/server/:action", post(handle))
            .with_state(self);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr: SocketAddr = listener.local_addr().expect("listener should have addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake VOS should run");
        });
        ServerConfig {
            name: name.to_string(),
            url: format!("http://{addr}"),
        }
    }
}

/// Config pointing at the given servers with defaults elsewhere
pub fn config_for(servers: Vec<ServerConfig>) -> Config {
    Config {
        servers,
        ..Config::default()
    }
}

/// A server address nothing listens on
pub fn dead_server(name: &str) -> ServerConfig {
    ServerConfig {
        name: name.to_string(),
        url: "http://127.0.0.1:9".to_string(),
    }
}

fn find<'a>(items: &'a [Map<String, Value>], key: &str, wanted: &str) -> Option<&'a Map<String, Value>> {
    items
        .iter()
        .find(|item| item.get(key).and_then(Value::as_str) == Some(wanted))
}

fn ok(mut body: Value) -> Json<Value> {
    body["retCode"] = json!(0);
    Json(body)
}

fn rejected(reason: &str) -> Json<Value> {
    Json(json!({"retCode": -10001, "exception": reason}))
}

async fn handle(
    State(fake): State<FakeVos>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut data = fake.data.lock();
    match action.as_str() {
        "GetAllCustomers" => {
            let accounts: Vec<Value> = data
                .customers
                .iter()
                .filter_map(|c| c.get("account").cloned())
                .collect();
            ok(json!({ "accounts": accounts }))
        }
        "GetCustomer" => {
            let wanted: HashSet<&str> = body["accounts"]
                .as_array()
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let found: Vec<Value> = data
                .customers
                .iter()
                .filter(|c| {
                    c.get("account")
                        .and_then(Value::as_str)
                        .map(|a| wanted.contains(a))
                        .unwrap_or(false)
                })
                .cloned()
                .map(Value::Object)
                .collect();
            ok(json!({ "infoCustomers": found }))
        }
        "GetGatewayMapping" => ok(json!({ "infoGatewayMappings": data.mappings.clone() })),
        "GetGatewayRouting" => ok(json!({ "infoGatewayRoutings": data.routings.clone() })),
        "ModifyCustomer" | "ModifyGatewayMapping" | "ModifyGatewayRouting" => {
            let key = if action == "ModifyCustomer" { "account" } else { "name" };
            let name = body[key].as_str().unwrap_or_default().to_string();
            if data.reject.contains(&name) {
                return rejected("Modification not allowed");
            }
            data.modifications.push((action.clone(), body.clone()));
            let fields = object(body);
            let store = match action.as_str() {
                "ModifyCustomer" => &mut data.customers,
                "ModifyGatewayMapping" => &mut data.mappings,
                _ => &mut data.routings,
            };
            match store
                .iter_mut()
                .find(|item| item.get(key).and_then(Value::as_str) == Some(name.as_str()))
            {
                Some(existing) if key == "account" => existing.extend(fields),
                Some(existing) => *existing = fields,
                None => return rejected("Object not exist"),
            }
            ok(json!({}))
        }
        _ => rejected("Unknown action"),
    }
}

/// Serve the control-plane API for `config` on an ephemeral port; returns its base URL
pub async fn spawn_admin(config: Config) -> String {
    let state = crate::web::AppState::new(config).expect("state should build");
    let app = crate::web::build_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr: SocketAddr = listener.local_addr().expect("listener should have addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("admin API should run");
    });
    format!("http://{addr}")
}

/// Typed API client for a base URL from [`spawn_admin`]
pub fn client_for(base_url: &str) -> crate::api::AdminClient {
    crate::api::AdminClient::new(&crate::core::config::ClientConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
    })
    .expect("client should build")
}
