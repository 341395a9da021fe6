//! Gateway records as VOS3000 returns them
//!
//! Updates are full-record writes, so records stay a JSON object and only the
//! fields vosadmin edits get typed accessors.

use crate::core::hash::object_hash;
use crate::rules::{split_csv, RewriteRules};
use crate::vos::client::action;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const FIELD_NAME: &str = "name";
pub const FIELD_LOCK_TYPE: &str = "lockType";
pub const CALLOUT_CALLER_PREFIXES: &str = "calloutCallerPrefixes";
pub const CALLOUT_CALLEE_PREFIXES: &str = "calloutCalleePrefixes";
pub const CALLIN_CALLER_PREFIXES: &str = "callinCallerPrefixes";
pub const CALLIN_CALLEE_PREFIXES: &str = "callinCalleePrefixes";
pub const REWRITE_RULES_IN_CALLER: &str = "rewriteRulesInCaller";

/// Gateway `lockType` values
pub mod lock {
    pub const ACTIVE: i64 = 0;
    pub const LOCKED: i64 = 1;
    /// Locked automatically because every prefix list became empty
    pub const AUTO_LOCKED_EMPTY: i64 = 3;
}

/// Mapping (outbound) or Routing (inbound) gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayKind {
    #[serde(rename = "MG")]
    Mapping,
    #[serde(rename = "RG")]
    Routing,
}

impl GatewayKind {
    pub fn list_action(self) -> &'static str {
        match self {
            GatewayKind::Mapping => action::GET_GATEWAY_MAPPING,
            GatewayKind::Routing => action::GET_GATEWAY_ROUTING,
        }
    }

    pub fn modify_action(self) -> &'static str {
        match self {
            GatewayKind::Mapping => action::MODIFY_GATEWAY_MAPPING,
            GatewayKind::Routing => action::MODIFY_GATEWAY_ROUTING,
        }
    }

    /// Reply field holding the gateway list
    pub fn list_field(self) -> &'static str {
        match self {
            GatewayKind::Mapping => "infoGatewayMappings",
            GatewayKind::Routing => "infoGatewayRoutings",
        }
    }

    /// Prefix field the operator edits by default
    pub fn caller_prefix_field(self) -> &'static str {
        match self {
            GatewayKind::Mapping => CALLOUT_CALLER_PREFIXES,
            GatewayKind::Routing => CALLIN_CALLER_PREFIXES,
        }
    }

    pub fn callee_prefix_field(self) -> &'static str {
        match self {
            GatewayKind::Mapping => CALLOUT_CALLEE_PREFIXES,
            GatewayKind::Routing => CALLIN_CALLEE_PREFIXES,
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            GatewayKind::Mapping => "MG",
            GatewayKind::Routing => "RG",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GatewayKind::Mapping => "Mapping Gateway",
            GatewayKind::Routing => "Routing Gateway",
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// One gateway, field-for-field as stored on the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayRecord(Map<String, Value>);

impl GatewayRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accept only JSON objects
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        self.str_field(FIELD_NAME)
    }

    /// A string field, or "" when absent or not a string
    pub fn str_field(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn lock_type(&self) -> Option<i64> {
        match self.0.get(FIELD_LOCK_TYPE)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn set_lock_type(&mut self, lock_type: i64) {
        self.0
            .insert(FIELD_LOCK_TYPE.to_string(), Value::from(lock_type));
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.lock_type(), Some(lock::LOCKED) | Some(lock::AUTO_LOCKED_EMPTY))
    }

    /// Entries of a comma-joined prefix field
    pub fn prefixes(&self, key: &str) -> Vec<String> {
        split_csv(self.str_field(key))
    }

    pub fn rewrite_rules(&self) -> RewriteRules {
        RewriteRules::parse(self.str_field(REWRITE_RULES_IN_CALLER))
    }

    pub fn set_rewrite_rules(&mut self, rules: &RewriteRules) {
        self.set_str(REWRITE_RULES_IN_CALLER, rules.serialize());
    }

    /// Optimistic-concurrency token of the record as fetched
    pub fn hash(&self) -> String {
        object_hash(&Value::Object(self.0.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
