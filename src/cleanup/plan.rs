//! Corrected payloads for scanned gateways

use crate::cleanup::scan::{CleanupFinding, MappingFinding, RoutingFinding};
use crate::vos::record::{
    lock, GatewayKind, GatewayRecord, CALLIN_CALLEE_PREFIXES, CALLIN_CALLER_PREFIXES,
    CALLOUT_CALLER_PREFIXES,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One gateway write of a cleanup batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupTask {
    pub server_name: String,
    pub gateway_name: String,
    #[serde(rename = "type")]
    pub kind: GatewayKind,
    pub updated_payload: GatewayRecord,
}

pub fn plan(finding: &CleanupFinding) -> CleanupTask {
    let updated_payload = match finding {
        CleanupFinding::Mapping(f) => plan_mapping(f),
        CleanupFinding::Routing(f) => plan_routing(f),
    };
    CleanupTask {
        server_name: finding.server_name().to_string(),
        gateway_name: finding.name().to_string(),
        kind: finding.kind(),
        updated_payload,
    }
}

fn without(list: &[String], remove: &[String]) -> Vec<String> {
    let remove: HashSet<&str> = remove.iter().map(String::as_str).collect();
    list.iter()
        .filter(|entry| !remove.contains(entry.as_str()))
        .cloned()
        .collect()
}

fn plan_mapping(finding: &MappingFinding) -> GatewayRecord {
    let caller = without(&finding.original_caller_prefixes, &finding.common_in_caller);
    let mut payload = finding.raw.clone();
    payload.set_str(CALLOUT_CALLER_PREFIXES, caller.join(","));
    if caller.is_empty() && finding.original_callee_prefixes.is_empty() {
        payload.set_lock_type(lock::AUTO_LOCKED_EMPTY);
    }
    payload
}

fn plan_routing(finding: &RoutingFinding) -> GatewayRecord {
    let caller = without(&finding.original_caller_prefixes, &finding.common_in_caller);
    let callee = without(&finding.original_callee_prefixes, &finding.common_in_callee);

    let mut rules = finding.original_rewrite.clone();
    for key in &finding.virtual_keys_to_delete {
        rules.remove(key);
    }
    for (key, numbers) in &finding.real_values_to_delete {
        let numbers: HashSet<&str> = numbers.iter().map(String::as_str).collect();
        rules.remove_reals(key, &numbers);
    }

    let mut payload = finding.raw.clone();
    payload.set_str(CALLIN_CALLER_PREFIXES, caller.join(","));
    payload.set_str(CALLIN_CALLEE_PREFIXES, callee.join(","));
    payload.set_rewrite_rules(&rules);
    payload
}
