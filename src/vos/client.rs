//! VOS3000 web API client
//!
//! Every VOS3000 action is a JSON `POST {server}/external/server/{Action}`.
//! The reply always carries a `retCode`; anything other than 0 is a rejection
//! whose reason is in `exception`.

use crate::core::config::{ServerConfig, VosConfig};
use crate::core::error::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// VOS3000 actions used by vosadmin
pub mod action {
    pub const GET_ALL_CUSTOMERS: &str = "GetAllCustomers";
    pub const GET_CUSTOMER: &str = "GetCustomer";
    pub const MODIFY_CUSTOMER: &str = "ModifyCustomer";
    pub const GET_GATEWAY_MAPPING: &str = "GetGatewayMapping";
    pub const MODIFY_GATEWAY_MAPPING: &str = "ModifyGatewayMapping";
    pub const GET_GATEWAY_ROUTING: &str = "GetGatewayRouting";
    pub const MODIFY_GATEWAY_ROUTING: &str = "ModifyGatewayRouting";
}

/// Shared, cheaply clonable client for all configured servers
#[derive(Clone)]
pub struct VosClient {
    client: Client,
    endpoint_prefix: String,
}

impl VosClient {
    pub fn new(config: &VosConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::ConfigError {
                message: format!("Failed to build VOS HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint_prefix: format!("/{}", config.endpoint_prefix.trim_matches('/')),
        })
    }

    fn url(&self, server: &ServerConfig, action: &str) -> String {
        format!(
            "{}{}/{}",
            server.url.trim_end_matches('/'),
            self.endpoint_prefix,
            action
        )
    }

    /// Call one action and return the decoded reply body
    pub async fn call<T>(&self, server: &ServerConfig, action: &str, payload: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(server, action);
        debug!(server = %server.name, action, "Calling VOS API");

        let res = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(server, action, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(server = %server.name, action, %status, "VOS API returned HTTP error");
            return Err(Error::Vos {
                server: server.name.clone(),
                message: format!("{} failed: HTTP {} - {}", action, status, text),
            });
        }

        let body: Value = res.json().await.map_err(|e| Error::Vos {
            server: server.name.clone(),
            message: format!("Failed to parse {} response: {}", action, e),
        })?;

        check_ret_code(&server.name, action, body)
    }

    fn transport_error(&self, server: &ServerConfig, action: &str, e: reqwest::Error) -> Error {
        let message = if e.is_connect() {
            format!("Cannot connect to {} at {}", server.name, server.url)
        } else if e.is_timeout() {
            format!("{} on {} timed out", action, server.name)
        } else {
            format!("{} on {} failed: {}", action, server.name, e)
        };
        warn!(server = %server.name, action, "{}", message);
        Error::Transport { message }
    }
}

fn check_ret_code(server: &str, action: &str, body: Value) -> Result<Value> {
    let code = match body.get("retCode") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    match code {
        Some(0) => Ok(body),
        other => {
            let reason = body
                .get("exception")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| match other {
                    Some(c) => format!("retCode {}", c),
                    None => "missing retCode".to_string(),
                });
            Err(Error::Vos {
                server: server.to_string(),
                message: format!("{}: {}", action, reason),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ret_code_zero_passes_body_through() {
        let body = json!({"retCode": 0, "accounts": ["A1"]});
        let out = check_ret_code("S1", "GetAllCustomers", body.clone()).unwrap();
        assert_eq!(out, body);

        let body = json!({"retCode": "0"});
        assert!(check_ret_code("S1", "GetCustomer", body).is_ok());
    }

    #[test]
    fn test_non_zero_ret_code_uses_exception() {
        let body = json!({"retCode": -10007, "exception": "Account not exist"});
        let err = check_ret_code("S1", "GetCustomer", body).unwrap_err();
        match err {
            Error::Vos { server, message } => {
                assert_eq!(server, "S1");
                assert_eq!(message, "GetCustomer: Account not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_ret_code_is_rejected() {
        let err = check_ret_code("S1", "GetGatewayMapping", json!({})).unwrap_err();
        assert!(err.to_string().contains("missing retCode"));
    }

    #[test]
    fn test_url_joins_prefix() {
        let client = VosClient::new(&VosConfig::default()).unwrap();
        let server = ServerConfig {
            name: "S1".to_string(),
            url: "http://10.0.0.5:1221/".to_string(),
        };
        assert_eq!(
            client.url(&server, action::GET_CUSTOMER),
            "http://10.0.0.5:1221/external/server/GetCustomer"
        );
    }
}
