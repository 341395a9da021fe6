//! Where numbers appear across the fleet

use crate::core::error::{Error, Result};
use crate::fleet::{Fleet, FleetResults};
use crate::rules::numbers::search_variants;
use crate::vos::gateways;
use crate::vos::record::{
    GatewayKind, GatewayRecord, CALLIN_CALLEE_PREFIXES, CALLIN_CALLER_PREFIXES,
    CALLOUT_CALLER_PREFIXES,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumberField {
    CalloutCallerPrefixes,
    CallinCallerPrefixes,
    CallinCalleePrefixes,
    #[serde(rename = "RewriteRule (Key)")]
    RewriteKey,
    #[serde(rename = "RewriteRule (Real Numbers)")]
    RewriteReals,
}

impl fmt::Display for NumberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NumberField::CalloutCallerPrefixes => "CalloutCallerPrefixes",
            NumberField::CallinCallerPrefixes => "CallinCallerPrefixes",
            NumberField::CallinCalleePrefixes => "CallinCalleePrefixes",
            NumberField::RewriteKey => "RewriteRule (Key)",
            NumberField::RewriteReals => "RewriteRule (Real Numbers)",
        };
        f.write_str(label)
    }
}

/// One field of one gateway that contains searched numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFinding {
    pub server_name: String,
    #[serde(rename = "type")]
    pub kind: GatewayKind,
    pub gateway_name: String,
    pub field: NumberField,
    pub found_values: Vec<String>,
    /// Operator inputs that produced the found values
    pub matching_inputs: Vec<String>,
    /// Virtual key the match sits under, for rewrite-rule fields
    pub rewrite_key: Option<String>,
}

/// Matches a gateway field against the searched numbers
struct Matcher<'a> {
    server_name: &'a str,
    targets: &'a BTreeSet<String>,
    originals: &'a [String],
}

impl Matcher<'_> {
    fn inputs_for(&self, found: &BTreeSet<String>) -> Vec<String> {
        self.originals
            .iter()
            .filter(|orig| {
                let variants = search_variants(orig);
                found.iter().any(|f| variants.contains(f))
            })
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn finding<'v>(
        &self,
        gateway: &GatewayRecord,
        kind: GatewayKind,
        field: NumberField,
        values: impl IntoIterator<Item = &'v String>,
        rewrite_key: Option<&str>,
    ) -> Option<NumberFinding> {
        let found: BTreeSet<String> = values
            .into_iter()
            .filter(|v| self.targets.contains(v.as_str()))
            .cloned()
            .collect();
        if found.is_empty() {
            return None;
        }
        Some(NumberFinding {
            server_name: self.server_name.to_string(),
            kind,
            gateway_name: gateway.name().to_string(),
            field,
            matching_inputs: self.inputs_for(&found),
            found_values: found.into_iter().collect(),
            rewrite_key: rewrite_key.map(str::to_string),
        })
    }

    fn mapping(&self, mg: &GatewayRecord) -> Vec<NumberFinding> {
        let caller = mg.prefixes(CALLOUT_CALLER_PREFIXES);
        self.finding(mg, GatewayKind::Mapping, NumberField::CalloutCallerPrefixes, &caller, None)
            .into_iter()
            .collect()
    }

    fn routing(&self, rg: &GatewayRecord) -> Vec<NumberFinding> {
        let kind = GatewayKind::Routing;
        let caller = rg.prefixes(CALLIN_CALLER_PREFIXES);
        let callee = rg.prefixes(CALLIN_CALLEE_PREFIXES);

        let mut findings: Vec<NumberFinding> = [
            self.finding(rg, kind, NumberField::CallinCallerPrefixes, &caller, None),
            self.finding(rg, kind, NumberField::CallinCalleePrefixes, &callee, None),
        ]
        .into_iter()
        .flatten()
        .collect();

        for (key, target) in rg.rewrite_rules().iter() {
            let key_owned = key.to_string();
            findings.extend(self.finding(
                rg,
                kind,
                NumberField::RewriteKey,
                std::iter::once(&key_owned),
                Some(key),
            ));
            findings.extend(self.finding(
                rg,
                kind,
                NumberField::RewriteReals,
                target.routable_reals(),
                Some(key),
            ));
        }
        findings
    }
}

impl Fleet {
    /// Every gateway field on every server that contains one of `numbers`
    /// (or, with variant expansion, one of their other written forms)
    pub async fn number_info(&self, numbers: &[String]) -> Result<FleetResults<NumberFinding>> {
        let targets = self.search_targets(numbers);
        if targets.is_empty() {
            return Err(Error::validation("Payload must contain a 'numbers' list."));
        }
        let targets = &targets;

        Ok(self
            .fan_out("Number search", |vos, server| async move {
                let (mappings, routings) = futures::try_join!(
                    gateways::fetch_all(vos, server, GatewayKind::Mapping),
                    gateways::fetch_all(vos, server, GatewayKind::Routing),
                )?;
                let matcher = Matcher {
                    server_name: &server.name,
                    targets,
                    originals: numbers,
                };
                let mut findings: Vec<NumberFinding> =
                    mappings.iter().flat_map(|mg| matcher.mapping(mg)).collect();
                findings.extend(routings.iter().flat_map(|rg| matcher.routing(rg)));
                Ok(findings)
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config_for, FakeVos};
    use crate::vos::client::VosClient;
    use serde_json::json;
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_routing_findings_per_field() {
        let targets: BTreeSet<String> = strings(&["84901", "0901", "901", "777"]).into_iter().collect();
        let originals = strings(&["0901", "777"]);
        let matcher = Matcher {
            server_name: "S1",
            targets: &targets,
            originals: &originals,
        };
        let rg = GatewayRecord::from_value(json!({
            "name": "RG1",
            "callinCallerPrefixes": "84901,123",
            "rewriteRulesInCaller": "777:901;555,888:hetso"
        }))
        .unwrap();

        let findings = matcher.routing(&rg);
        assert_eq!(findings.len(), 3);

        assert_eq!(findings[0].field, NumberField::CallinCallerPrefixes);
        assert_eq!(findings[0].found_values, strings(&["84901"]));
        assert_eq!(findings[0].matching_inputs, strings(&["0901"]));
        assert_eq!(findings[0].rewrite_key, None);

        assert_eq!(findings[1].field, NumberField::RewriteKey);
        assert_eq!(findings[1].rewrite_key.as_deref(), Some("777"));
        assert_eq!(findings[1].matching_inputs, strings(&["777"]));

        assert_eq!(findings[2].field, NumberField::RewriteReals);
        assert_eq!(findings[2].found_values, strings(&["901"]));
        assert_eq!(findings[2].rewrite_key.as_deref(), Some("777"));
    }

    #[test]
    fn test_field_labels() {
        assert_eq!(
            serde_json::to_value(NumberField::RewriteReals).unwrap(),
            json!("RewriteRule (Real Numbers)")
        );
        assert_eq!(NumberField::CalloutCallerPrefixes.to_string(), "CalloutCallerPrefixes");
    }

    #[tokio::test]
    async fn test_number_info_across_servers() {
        let s1 = FakeVos::new()
            .with_mapping(json!({"name": "MG1", "calloutCallerPrefixes": "0912345678"}))
            .with_routing(json!({"name": "RG1", "rewriteRulesInCaller": "190012:84912345678"}))
            .spawn("S1")
            .await;
        let config = config_for(vec![s1]);
        let fleet = Fleet::new(VosClient::new(&config.vos).unwrap(), Arc::new(config));

        let found = fleet.number_info(&strings(&["+84912345678"])).await.unwrap();
        assert!(found.errors.is_empty());
        let fields: Vec<NumberField> = found.results.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec![NumberField::CalloutCallerPrefixes, NumberField::RewriteReals]);
        assert_eq!(found.results[0].matching_inputs, strings(&["+84912345678"]));

        assert!(fleet.number_info(&strings(&[" "])).await.is_err());
    }
}
