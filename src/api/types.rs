//! Request and response bodies of the control-plane REST surface

use crate::cleanup::CleanupTask;
use crate::credit::CreditLimit;
use crate::fleet::CustomerFilter;
use crate::vos::customers::LockStatus;
use crate::vos::record::{GatewayKind, GatewayRecord};
use serde::{Deserialize, Serialize};

/// URL segment under `/servers/{server}/` for a gateway kind
pub fn gateway_segment(kind: GatewayKind) -> &'static str {
    match kind {
        GatewayKind::Mapping => "mapping-gateways",
        GatewayKind::Routing => "routing-gateways",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub servers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    /// Hash of the record as it is now, on conflicts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSearchQuery {
    pub filter_text: String,
    #[serde(default)]
    pub filter_type: CustomerFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditLimitUpdate {
    pub new_limit: CreditLimit,
    #[serde(default)]
    pub initial_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockStatusUpdate {
    pub new_lock_status: LockStatus,
    #[serde(default)]
    pub initial_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayListQuery {
    #[serde(default)]
    pub filter_text: String,
}

/// A gateway record as served, with its concurrency hash alongside the fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDetails {
    #[serde(flatten)]
    pub record: GatewayRecord,
    pub hash: String,
}

impl GatewayDetails {
    pub fn new(record: GatewayRecord) -> Self {
        let hash = record.hash();
        Self { record, hash }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayUpdate {
    pub payload_update_data: GatewayRecord,
    #[serde(default)]
    pub initial_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealsUpdate {
    #[serde(default)]
    pub new_reals: Vec<String>,
    #[serde(default)]
    pub initial_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySearchQuery {
    pub term: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualNumberQuery {
    pub server_name: String,
    pub rg_name: String,
    pub vn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualNumberStatusResponse {
    pub found: bool,
    pub definition: crate::fleet::VirtualNumberStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumbersRequest {
    #[serde(default)]
    pub numbers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupExecuteRequest {
    #[serde(default)]
    pub tasks: Vec<CleanupTask>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_details_flatten() {
        let record = GatewayRecord::from_value(json!({"name": "RG1", "lockType": 0})).unwrap();
        let details = GatewayDetails::new(record.clone());
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["name"], json!("RG1"));
        assert_eq!(value["hash"], json!(record.hash()));

        let back: GatewayDetails = serde_json::from_value(value).unwrap();
        assert_eq!(back.record, record);
    }

    #[test]
    fn test_update_bodies_accept_frontend_shapes() {
        let body: CreditLimitUpdate =
            serde_json::from_value(json!({"new_limit": "-1", "initial_hash": "abc"})).unwrap();
        assert_eq!(body.new_limit, CreditLimit::Unlimited);

        let body: LockStatusUpdate = serde_json::from_value(json!({"new_lock_status": "1"})).unwrap();
        assert_eq!(body.new_lock_status, LockStatus::Locked);
        assert!(body.initial_hash.is_none());
    }

    #[test]
    fn test_error_body_omits_missing_hash() {
        let body = ErrorBody {
            detail: "nope".to_string(),
            current_hash: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"detail": "nope"}));
    }
}
