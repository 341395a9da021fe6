//! Control-plane HTTP server
//!
//! Routes are grouped by feature file; this module owns state, the router
//! and the serve loop.

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::api::types::{HealthResponse, MessageResponse, ServerEntry};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::fleet::Fleet;
use crate::vos::client::VosClient;
use crate::vos::record::GatewayKind;
use crate::web::cleanup::{api_cleanup_execute, api_cleanup_scan};
use crate::web::customers::{
    api_customer_details, api_search_customers, api_update_credit_limit, api_update_lock_status,
};
use crate::web::gateways::{api_add_rule_reals, api_replace_rule_reals, gateway_routes};
use crate::web::search::{
    api_linked_customers, api_number_info, api_rewrite_keys, api_rewrite_search,
    api_virtual_number_status,
};

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub fleet: Fleet,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let vos = VosClient::new(&config.vos)?;
        Ok(Self {
            fleet: Fleet::new(vos, Arc::new(config)),
        })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn api_root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the VOS3000 admin API."))
}

async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        servers: state.fleet.config().servers.len(),
    })
}

async fn api_servers(State(state): State<AppState>) -> Json<Vec<ServerEntry>> {
    Json(
        state
            .fleet
            .config()
            .servers
            .iter()
            .map(|s| ServerEntry { name: s.name.clone() })
            .collect(),
    )
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn build_app(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(api_root))
        .route("/health", get(api_health))
        .route("/servers", get(api_servers))
        // Customers
        .route("/customers/search", get(api_search_customers))
        .route("/servers/:server/customers/:id", get(api_customer_details))
        .route(
            "/servers/:server/customers/:id/credit-limit",
            put(api_update_credit_limit),
        )
        .route(
            "/servers/:server/customers/:id/lock-status",
            put(api_update_lock_status),
        )
        // Rewrite rules inside a Routing Gateway
        .route(
            "/servers/:server/routing-gateways/:name/rules/:vk/reals",
            post(api_add_rule_reals).put(api_replace_rule_reals),
        )
        // Searches
        .route("/rewrite-rules/search", get(api_rewrite_search))
        .route("/rewrite-rules/keys", get(api_rewrite_keys))
        .route("/status/virtual-number", get(api_virtual_number_status))
        .route("/virtual-numbers/:vn/customers", get(api_linked_customers))
        .route("/search/number-info", post(api_number_info))
        // Cleanup
        .route("/cleanup/scan", post(api_cleanup_scan))
        .route("/cleanup/execute", post(api_cleanup_execute));

    let router = gateway_routes(router, GatewayKind::Mapping);
    let router = gateway_routes(router, GatewayKind::Routing);
    router.with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let addr: SocketAddr = config.http.bind.parse().map_err(|_| Error::ConfigError {
        message: format!("Invalid bind address '{}'", config.http.bind),
    })?;
    let servers = config.servers.len();
    let app = build_app(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, servers, "vosadmin API listening");
    eprintln!("\x1b[36m>\x1b[0m vosadmin API running at \x1b[36mhttp://{}\x1b[0m", addr);
    eprintln!("\x1b[90m  Press Ctrl+C to stop\x1b[0m");

    axum::serve(listener, app).await?;
    Ok(())
}
