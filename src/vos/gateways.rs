//! Mapping and Routing Gateway operations on one server

use crate::core::config::ServerConfig;
use crate::core::error::{Error, Result};
use crate::rules::{append_reals, count_csv, RewriteRules, RuleTarget};
use crate::vos::client::VosClient;
use crate::vos::record::{GatewayKind, GatewayRecord};
use serde_json::{json, Value};
use tracing::info;

const CONFLICT_MESSAGE: &str =
    "The data has been modified by another user. Please reload and try again.";

/// Fetch every gateway of a kind, unfiltered and unsorted
pub async fn fetch_all(
    vos: &VosClient,
    server: &ServerConfig,
    kind: GatewayKind,
) -> Result<Vec<GatewayRecord>> {
    let body = vos.call(server, kind.list_action(), &json!({})).await?;
    let items = match body.get(kind.list_field()) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(GatewayRecord::from_value)
        .collect())
}

/// Gateways whose name contains `filter` (case-insensitive), sorted by name
pub async fn list(
    vos: &VosClient,
    server: &ServerConfig,
    kind: GatewayKind,
    filter: &str,
) -> Result<Vec<GatewayRecord>> {
    let mut gateways = fetch_all(vos, server, kind).await?;
    let needle = filter.trim().to_lowercase();
    if !needle.is_empty() {
        gateways.retain(|g| g.name().to_lowercase().contains(&needle));
    }
    gateways.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(gateways)
}

/// One gateway by exact name
pub async fn details(
    vos: &VosClient,
    server: &ServerConfig,
    kind: GatewayKind,
    name: &str,
) -> Result<GatewayRecord> {
    if name.is_empty() {
        return Err(Error::validation(format!("{} name cannot be empty.", kind.label())));
    }
    fetch_all(vos, server, kind)
        .await?
        .into_iter()
        .find(|g| g.name() == name)
        .ok_or_else(|| {
            Error::not_found(format!(
                "{} '{}' not found on server {}.",
                kind.label(),
                name,
                server.name
            ))
        })
}

/// Write a full gateway record.
///
/// With `initial_hash`, the gateway is re-fetched first and the write is
/// refused with a conflict if it changed since the caller read it. The
/// payload may carry a different `name` to rename the gateway.
pub async fn update(
    vos: &VosClient,
    server: &ServerConfig,
    kind: GatewayKind,
    name: &str,
    payload: &GatewayRecord,
    initial_hash: Option<&str>,
) -> Result<String> {
    if payload.is_empty() {
        return Err(Error::validation("Update payload cannot be empty."));
    }
    let effective_name = match payload.name() {
        "" => name,
        renamed => renamed,
    };
    if effective_name.is_empty() {
        return Err(Error::validation(format!(
            "{} name cannot be empty for update.",
            kind.label()
        )));
    }

    if let Some(expected) = initial_hash.filter(|h| !h.is_empty()) {
        let latest = details(vos, server, kind, name).await?;
        let latest_hash = latest.hash();
        if latest_hash != expected {
            info!(server = %server.name, gateway = name, "Rejecting stale gateway update");
            return Err(Error::conflict(CONFLICT_MESSAGE, Some(latest_hash)));
        }
    }

    vos.call(server, kind.modify_action(), payload).await?;
    info!(server = %server.name, gateway = effective_name, kind = kind.short(), "Gateway updated");

    Ok(format!(
        "{} '{}' on server {} updated successfully.",
        kind.label(),
        effective_name,
        server.name
    ))
}

/// Write a precomputed cleanup payload without a conflict check
pub async fn apply_cleanup(
    vos: &VosClient,
    server: &ServerConfig,
    kind: GatewayKind,
    name: &str,
    payload: &GatewayRecord,
) -> Result<String> {
    vos.call(server, kind.modify_action(), payload)
        .await
        .map_err(|e| match e {
            Error::Vos { server, message } => Error::Vos {
                message: format!(
                    "Error updating {} '{}' for cleanup: {}",
                    kind.label(),
                    name,
                    message
                ),
                server,
            },
            other => other,
        })?;

    let remaining = count_csv(payload.str_field(kind.caller_prefix_field()));
    Ok(format!(
        "{} '{}' on {} updated. New caller prefix count: {}.",
        kind.label(),
        name,
        server.name,
        remaining
    ))
}

/// Append real numbers to one rewrite-rule key of a Routing Gateway.
///
/// Without `initial_hash` the hash of the record just read is used, so a
/// write racing this read is still refused.
pub async fn add_rule_reals(
    vos: &VosClient,
    server: &ServerConfig,
    rg_name: &str,
    virtual_key: &str,
    new_reals: &[String],
    initial_hash: Option<&str>,
) -> Result<String> {
    if new_reals.iter().all(|n| n.trim().is_empty()) {
        return Err(Error::validation("Payload must contain a 'new_reals' list."));
    }
    let rg = details(vos, server, GatewayKind::Routing, rg_name).await?;
    let mut rules = rg.rewrite_rules();
    let combined = append_reals(rules.get(virtual_key), new_reals);
    let total = combined.len();
    rules.insert(virtual_key, RuleTarget::Reals(combined));

    write_rules(vos, server, &rg, &rules, initial_hash).await?;
    Ok(format!(
        "Successfully added numbers to rule '{}' in RG '{}'. New total: {}.",
        virtual_key, rg_name, total
    ))
}

/// Replace what one rewrite-rule key points to; `None` deletes the key
pub async fn set_rule_target(
    vos: &VosClient,
    server: &ServerConfig,
    rg_name: &str,
    virtual_key: &str,
    target: Option<RuleTarget>,
    initial_hash: Option<&str>,
) -> Result<String> {
    let rg = details(vos, server, GatewayKind::Routing, rg_name).await?;
    let mut rules = rg.rewrite_rules();
    let message = match target {
        Some(target) => {
            let count = target.real_count();
            rules.insert(virtual_key, target);
            format!(
                "Rule '{}' in RG '{}' now has {} real number(s).",
                virtual_key, rg_name, count
            )
        }
        None => {
            rules.remove(virtual_key);
            format!("Rule '{}' removed from RG '{}'.", virtual_key, rg_name)
        }
    };

    write_rules(vos, server, &rg, &rules, initial_hash).await?;
    Ok(message)
}

async fn write_rules(
    vos: &VosClient,
    server: &ServerConfig,
    rg: &GatewayRecord,
    rules: &RewriteRules,
    initial_hash: Option<&str>,
) -> Result<String> {
    let read_hash = rg.hash();
    let expected = initial_hash.filter(|h| !h.is_empty()).unwrap_or(&read_hash);
    let mut payload = rg.clone();
    payload.set_rewrite_rules(rules);
    update(vos, server, GatewayKind::Routing, rg.name(), &payload, Some(expected)).await
}
