//! Finding gateways that reference numbers being purged

use crate::rules::{split_csv, RewriteRules};
use crate::rules::numbers::is_virtual_key_candidate;
use crate::vos::record::{
    GatewayKind, GatewayRecord, CALLIN_CALLEE_PREFIXES, CALLIN_CALLER_PREFIXES,
    CALLOUT_CALLEE_PREFIXES, CALLOUT_CALLER_PREFIXES,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A Mapping Gateway whose caller prefixes contain purge targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingFinding {
    pub server_name: String,
    pub name: String,
    pub original_caller_prefixes: Vec<String>,
    pub original_callee_prefixes: Vec<String>,
    pub common_in_caller: Vec<String>,
    pub raw: GatewayRecord,
}

/// A Routing Gateway referencing purge targets in prefixes or rewrite rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingFinding {
    pub server_name: String,
    pub name: String,
    pub original_caller_prefixes: Vec<String>,
    pub common_in_caller: Vec<String>,
    pub original_callee_prefixes: Vec<String>,
    pub common_in_callee: Vec<String>,
    pub original_rewrite: RewriteRules,
    /// Keys that are themselves targets; the whole entry goes
    pub virtual_keys_to_delete: Vec<String>,
    /// Per key, real numbers that are targets
    pub real_values_to_delete: BTreeMap<String, Vec<String>>,
    pub raw: GatewayRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CleanupFinding {
    #[serde(rename = "MG")]
    Mapping(MappingFinding),
    #[serde(rename = "RG")]
    Routing(RoutingFinding),
}

impl CleanupFinding {
    pub fn kind(&self) -> GatewayKind {
        match self {
            CleanupFinding::Mapping(_) => GatewayKind::Mapping,
            CleanupFinding::Routing(_) => GatewayKind::Routing,
        }
    }

    pub fn server_name(&self) -> &str {
        match self {
            CleanupFinding::Mapping(f) => &f.server_name,
            CleanupFinding::Routing(f) => &f.server_name,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CleanupFinding::Mapping(f) => &f.name,
            CleanupFinding::Routing(f) => &f.name,
        }
    }

    /// Total matched entries across all fields
    pub fn match_count(&self) -> usize {
        match self {
            CleanupFinding::Mapping(f) => f.common_in_caller.len(),
            CleanupFinding::Routing(f) => {
                f.common_in_caller.len()
                    + f.common_in_callee.len()
                    + f.virtual_keys_to_delete.len()
                    + f.real_values_to_delete.values().map(Vec::len).sum::<usize>()
            }
        }
    }
}

/// Sorted, de-duplicated entries of `list` that are targets
fn intersect(list: &[String], targets: &BTreeSet<String>) -> Vec<String> {
    list.iter()
        .filter(|entry| targets.contains(entry.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn scan_mapping(
    server_name: &str,
    record: &GatewayRecord,
    targets: &BTreeSet<String>,
) -> Option<CleanupFinding> {
    let caller = split_csv(record.str_field(CALLOUT_CALLER_PREFIXES));
    let common_in_caller = intersect(&caller, targets);
    if common_in_caller.is_empty() {
        return None;
    }

    Some(CleanupFinding::Mapping(MappingFinding {
        server_name: server_name.to_string(),
        name: record.name().to_string(),
        original_caller_prefixes: caller,
        original_callee_prefixes: split_csv(record.str_field(CALLOUT_CALLEE_PREFIXES)),
        common_in_caller,
        raw: record.clone(),
    }))
}

/// Scan one Routing Gateway.
///
/// With `key_digits`, a virtual key only matches when it is all digits of
/// exactly that length.
pub fn scan_routing(
    server_name: &str,
    record: &GatewayRecord,
    targets: &BTreeSet<String>,
    key_digits: Option<usize>,
) -> Option<CleanupFinding> {
    let caller = split_csv(record.str_field(CALLIN_CALLER_PREFIXES));
    let callee = split_csv(record.str_field(CALLIN_CALLEE_PREFIXES));
    let rules = record.rewrite_rules();

    let common_in_caller = intersect(&caller, targets);
    let common_in_callee = intersect(&callee, targets);

    let virtual_keys_to_delete: Vec<String> = rules
        .keys()
        .filter(|key| targets.contains(*key))
        .filter(|key| key_digits.map_or(true, |n| is_virtual_key_candidate(key, n)))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let real_values_to_delete: BTreeMap<String, Vec<String>> = rules
        .iter()
        .filter_map(|(key, target)| {
            let reals: Vec<String> = target.routable_reals().cloned().collect();
            let common = intersect(&reals, targets);
            (!common.is_empty()).then(|| (key.to_string(), common))
        })
        .collect();

    if common_in_caller.is_empty()
        && common_in_callee.is_empty()
        && virtual_keys_to_delete.is_empty()
        && real_values_to_delete.is_empty()
    {
        return None;
    }

    Some(CleanupFinding::Routing(RoutingFinding {
        server_name: server_name.to_string(),
        name: record.name().to_string(),
        original_caller_prefixes: caller,
        common_in_caller,
        original_callee_prefixes: callee,
        common_in_callee,
        original_rewrite: rules,
        virtual_keys_to_delete,
        real_values_to_delete,
        raw: record.clone(),
    }))
}
