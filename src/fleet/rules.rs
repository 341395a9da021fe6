//! Rewrite-rule definitions across the fleet

use crate::core::error::{Error, Result};
use crate::fleet::{Fleet, FleetResults};
use crate::rules::RuleTarget;
use crate::vos::gateways;
use crate::vos::record::{GatewayKind, GatewayRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A virtual key as defined in one Routing Gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub virtual_key: String,
    pub server_name: String,
    pub rg_name: String,
    /// `["hetso"]` when blocked
    pub reals: Vec<String>,
    pub real_numbers_count: usize,
    pub is_hetso: bool,
    /// Hash of the Routing Gateway as read, for a follow-up edit
    pub rg_hash: String,
}

impl RuleDefinition {
    fn new(server_name: &str, rg: &GatewayRecord, key: &str, target: &RuleTarget) -> Self {
        Self {
            virtual_key: key.to_string(),
            server_name: server_name.to_string(),
            rg_name: rg.name().to_string(),
            reals: target.to_list(),
            real_numbers_count: target.real_count(),
            is_hetso: target.is_blocked(),
            rg_hash: rg.hash(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNumberStatus {
    pub server_name: String,
    pub rg_name: String,
    pub real_numbers_count: usize,
    pub is_hetso: bool,
}

impl Fleet {
    async fn collect_definitions<P>(&self, label: &str, matches: P) -> FleetResults<RuleDefinition>
    where
        P: Fn(&str) -> bool + Copy,
    {
        self.fan_out(label, |vos, server| async move {
            let routings = gateways::fetch_all(vos, server, GatewayKind::Routing).await?;
            let mut found = Vec::new();
            for rg in &routings {
                for (key, target) in rg.rewrite_rules().iter() {
                    if matches(key) {
                        found.push(RuleDefinition::new(&server.name, rg, key, target));
                    }
                }
            }
            Ok(found)
        })
        .await
    }

    /// Definitions of exactly these virtual keys in every Routing Gateway
    pub async fn find_rule_definitions(&self, keys: &[String]) -> Result<FleetResults<RuleDefinition>> {
        let wanted: HashSet<&str> = keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if wanted.is_empty() {
            return Err(Error::validation("Query parameter 'keys' is required."));
        }
        let wanted = &wanted;
        Ok(self
            .collect_definitions("Rewrite rule search", move |key| wanted.contains(key))
            .await)
    }

    /// Definitions whose key contains `term`, case-insensitively
    pub async fn find_rule_keys(&self, term: &str) -> Result<FleetResults<RuleDefinition>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Err(Error::validation("Search term for rewrite rule keys cannot be empty."));
        }
        let term = term.as_str();
        Ok(self
            .collect_definitions("Rewrite key search", move |key| {
                key.to_lowercase().contains(term)
            })
            .await)
    }

    /// How one virtual number is defined in one Routing Gateway
    pub async fn virtual_number_status(
        &self,
        server_name: &str,
        rg_name: &str,
        vn: &str,
    ) -> Result<VirtualNumberStatus> {
        let server = self.server(server_name)?;
        let rg = gateways::details(self.vos(), server, GatewayKind::Routing, rg_name).await?;
        let rules = rg.rewrite_rules();
        let target = rules.get(vn).ok_or_else(|| {
            Error::not_found(format!(
                "Virtual number '{}' not found in RG '{}'.",
                vn, rg_name
            ))
        })?;
        Ok(VirtualNumberStatus {
            server_name: server.name.clone(),
            rg_name: rg_name.to_string(),
            real_numbers_count: target.real_count(),
            is_hetso: target.is_blocked(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config_for, FakeVos};
    use crate::vos::client::VosClient;
    use serde_json::json;
    use std::sync::Arc;

    async fn fleet() -> Fleet {
        let s1 = FakeVos::new()
            .with_routing(json!({"name": "RG-A", "rewriteRulesInCaller": "190012:111;222,190013:hetso"}))
            .with_routing(json!({"name": "RG-B", "rewriteRulesInCaller": "290012:333"}))
            .spawn("S1")
            .await;
        let config = config_for(vec![s1]);
        Fleet::new(VosClient::new(&config.vos).unwrap(), Arc::new(config))
    }

    #[tokio::test]
    async fn test_find_exact_definitions() {
        let fleet = fleet().await;
        let keys = vec!["190013".to_string(), "999".to_string()];
        let found = fleet.find_rule_definitions(&keys).await.unwrap();
        assert_eq!(found.results.len(), 1);
        let def = &found.results[0];
        assert_eq!(def.rg_name, "RG-A");
        assert!(def.is_hetso);
        assert_eq!(def.real_numbers_count, 0);
        assert_eq!(def.reals, vec!["hetso"]);

        assert!(fleet.find_rule_definitions(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_find_keys_by_substring() {
        let fleet = fleet().await;
        let found = fleet.find_rule_keys("0012").await.unwrap();
        let keys: Vec<&str> = found.results.iter().map(|d| d.virtual_key.as_str()).collect();
        assert_eq!(keys, vec!["190012", "290012"]);
        assert_eq!(found.results[0].real_numbers_count, 2);
    }

    #[tokio::test]
    async fn test_virtual_number_status() {
        let fleet = fleet().await;
        let status = fleet.virtual_number_status("S1", "RG-A", "190012").await.unwrap();
        assert_eq!(status.real_numbers_count, 2);
        assert!(!status.is_hetso);

        let err = fleet.virtual_number_status("S1", "RG-A", "5").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        let err = fleet.virtual_number_status("S9", "RG-A", "5").await.unwrap_err();
        assert!(matches!(err, Error::ServerNotFound { .. }));
    }
}
