//! Customer accounts on one server

use crate::core::config::ServerConfig;
use crate::core::error::{Error, Result};
use crate::core::hash::object_hash;
use crate::credit::CreditLimit;
use crate::vos::client::{action, VosClient};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::info;

const CONFLICT_MESSAGE: &str =
    "This customer's data has been modified by someone else. Please reload.";

/// Customer `lockType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Active,
    Locked,
}

impl LockStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(LockStatus::Active),
            1 => Some(LockStatus::Locked),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            LockStatus::Active => 0,
            LockStatus::Locked => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LockStatus::Active => "Active",
            LockStatus::Locked => "Locked",
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Self::from_code(n.as_i64()?),
            Value::String(s) => Self::from_code(s.trim().parse().ok()?),
            _ => None,
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LockStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code().to_string())
    }
}

impl<'de> Deserialize<'de> for LockStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        LockStatus::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid lock status: {}", value)))
    }
}

/// Customer detail with typed fields and the concurrency hash of the raw record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub account: String,
    pub name: Option<String>,
    pub agent_account: Option<String>,
    pub fee_rate_group: Option<String>,
    pub money: Option<f64>,
    pub limit_money: Option<CreditLimit>,
    pub today_consumption: Option<f64>,
    pub lock_type: Option<LockStatus>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub category: Option<Value>,
    pub start_time_ms: Option<i64>,
    pub valid_time_ms: Option<i64>,
    #[serde(rename = "startTimeISO")]
    pub start_time_iso: Option<String>,
    #[serde(rename = "validTimeISO")]
    pub valid_time_iso: Option<String>,
    pub memo: Option<String>,
    pub server_name: String,
    pub hash: String,
}

impl CustomerDetails {
    pub fn from_raw(server_name: &str, raw: &Map<String, Value>) -> Self {
        let start_time_ms = int_field(raw, "startTime");
        let valid_time_ms = int_field(raw, "validTime");
        Self {
            account: string_field(raw, "account").unwrap_or_default(),
            name: string_field(raw, "name"),
            agent_account: string_field(raw, "agentAccount"),
            fee_rate_group: string_field(raw, "feeRateGroup"),
            money: float_field(raw, "money"),
            limit_money: raw.get("limitMoney").and_then(CreditLimit::from_value),
            today_consumption: float_field(raw, "todayConsumption"),
            lock_type: raw.get("lockType").and_then(LockStatus::from_value),
            kind: raw.get("type").cloned(),
            category: raw.get("category").cloned(),
            start_time_ms,
            valid_time_ms,
            start_time_iso: start_time_ms.and_then(ms_to_iso8601),
            valid_time_iso: valid_time_ms.and_then(ms_to_iso8601),
            memo: string_field(raw, "memo"),
            server_name: server_name.to_string(),
            hash: object_hash(&Value::Object(raw.clone())),
        }
    }
}

/// One row of a customer search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub account_id: String,
    pub name: Option<String>,
    pub balance: Option<f64>,
    pub credit_limit: Option<CreditLimit>,
    pub lock_type: Option<LockStatus>,
    pub status: String,
    pub server_name: String,
}

impl CustomerSummary {
    pub fn from_raw(server_name: &str, raw: &Map<String, Value>) -> Self {
        let lock_type = raw.get("lockType").and_then(LockStatus::from_value);
        Self {
            account_id: string_field(raw, "account").unwrap_or_default(),
            name: string_field(raw, "name"),
            balance: float_field(raw, "money"),
            credit_limit: raw.get("limitMoney").and_then(CreditLimit::from_value),
            lock_type,
            status: lock_type.unwrap_or(LockStatus::Active).label().to_string(),
            server_name: server_name.to_string(),
        }
    }
}

/// Every account id on the server
pub async fn list_accounts(vos: &VosClient, server: &ServerConfig) -> Result<Vec<String>> {
    let body = vos.call(server, action::GET_ALL_CUSTOMERS, &json!({})).await?;
    Ok(body
        .get("accounts")
        .and_then(Value::as_array)
        .map(|accounts| {
            accounts
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

/// Raw records for a batch of accounts. Unknown accounts are simply absent.
pub async fn raw_customers(
    vos: &VosClient,
    server: &ServerConfig,
    accounts: &[String],
) -> Result<Vec<Map<String, Value>>> {
    if accounts.is_empty() {
        return Ok(Vec::new());
    }
    let body = vos
        .call(server, action::GET_CUSTOMER, &json!({ "accounts": accounts }))
        .await?;
    Ok(body
        .get("infoCustomers")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default())
}

/// Raw record of one account
pub async fn raw_customer(
    vos: &VosClient,
    server: &ServerConfig,
    account: &str,
) -> Result<Map<String, Value>> {
    if account.trim().is_empty() {
        return Err(Error::validation("Customer account cannot be empty."));
    }
    raw_customers(vos, server, &[account.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            Error::not_found(format!(
                "Customer {} not found on {}.",
                account, server.name
            ))
        })
}

pub async fn details(vos: &VosClient, server: &ServerConfig, account: &str) -> Result<CustomerDetails> {
    let raw = raw_customer(vos, server, account).await?;
    Ok(CustomerDetails::from_raw(&server.name, &raw))
}

pub async fn update_limit(
    vos: &VosClient,
    server: &ServerConfig,
    account: &str,
    limit: CreditLimit,
    initial_hash: Option<&str>,
) -> Result<String> {
    check_unchanged(vos, server, account, initial_hash).await?;

    let payload = json!({ "account": account, "limitMoney": limit.to_wire().to_string() });
    vos.call(server, action::MODIFY_CUSTOMER, &payload).await?;

    info!(server = %server.name, account, limit = %limit, "Credit limit updated");
    Ok("Successfully updated credit limit.".to_string())
}

pub async fn update_lock(
    vos: &VosClient,
    server: &ServerConfig,
    account: &str,
    status: LockStatus,
    initial_hash: Option<&str>,
) -> Result<String> {
    check_unchanged(vos, server, account, initial_hash).await?;

    let payload = json!({ "account": account, "lockType": status.code().to_string() });
    vos.call(server, action::MODIFY_CUSTOMER, &payload).await?;

    info!(server = %server.name, account, status = %status, "Lock status updated");
    let verb = match status {
        LockStatus::Locked => "locked",
        LockStatus::Active => "unlocked",
    };
    Ok(format!("Successfully {} account.", verb))
}

/// Re-fetch and compare hashes when the caller supplied one
async fn check_unchanged(
    vos: &VosClient,
    server: &ServerConfig,
    account: &str,
    initial_hash: Option<&str>,
) -> Result<()> {
    let Some(expected) = initial_hash.filter(|h| !h.is_empty()) else {
        return Ok(());
    };
    let latest = raw_customer(vos, server, account).await?;
    let latest_hash = object_hash(&Value::Object(latest));
    if latest_hash != expected {
        info!(server = %server.name, account, "Rejecting stale customer update");
        return Err(Error::conflict(CONFLICT_MESSAGE, Some(latest_hash)));
    }
    Ok(())
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn float_field(raw: &Map<String, Value>, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn int_field(raw: &Map<String, Value>, key: &str) -> Option<i64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Epoch milliseconds as RFC 3339 UTC; `None` outside chrono's range
fn ms_to_iso8601(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|t| t.to_rfc3339())
}


#[cfg(test)]
mod service_tests {
    use super::*;
    use crate::core::config::VosConfig;
    use crate::testing::FakeVos;

    async fn setup() -> (FakeVos, ServerConfig, VosClient) {
        let fake = FakeVos::new().with_customer(json!({
            "account": "KH001", "name": "Acme", "money": 100, "limitMoney": "500", "lockType": 0
        }));
        let server = fake.clone().spawn("S1").await;
        (fake, server, VosClient::new(&VosConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_update_limit_writes_wire_string() {
        let (fake, server, vos) = setup().await;
        let current = details(&vos, &server, "KH001").await.unwrap();
        update_limit(&vos, &server, "KH001", CreditLimit::Unlimited, Some(&current.hash))
            .await
            .unwrap();
        assert_eq!(fake.customer("KH001").unwrap()["limitMoney"], json!("-1"));
    }

    #[tokio::test]
    async fn test_lock_conflict_after_concurrent_change() {
        let (fake, server, vos) = setup().await;
        let current = details(&vos, &server, "KH001").await.unwrap();
        fake.touch_customer("KH001", "money", json!(90));

        let err = update_lock(&vos, &server, "KH001", LockStatus::Locked, Some(&current.hash))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().starts_with("CONFLICT_ERROR"));
    }

    #[tokio::test]
    async fn test_lock_message() {
        let (_fake, server, vos) = setup().await;
        let message = update_lock(&vos, &server, "KH001", LockStatus::Locked, None).await.unwrap();
        assert_eq!(message, "Successfully locked account.");
        let message = update_lock(&vos, &server, "KH001", LockStatus::Active, None).await.unwrap();
        assert_eq!(message, "Successfully unlocked account.");
    }

    #[tokio::test]
    async fn test_unknown_account_not_found() {
        let (_fake, server, vos) = setup().await;
        let err = details(&vos, &server, "nobody").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
