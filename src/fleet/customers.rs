//! Customer lookups across the fleet

use crate::core::error::{Error, Result};
use crate::fleet::{Fleet, FleetResults};
use crate::vos::customers::{self, CustomerSummary};
use crate::vos::gateways;
use crate::vos::record::{GatewayKind, CALLOUT_CALLER_PREFIXES};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerFilter {
    #[default]
    AccountId,
    AccountName,
}

impl fmt::Display for CustomerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerFilter::AccountId => f.write_str("account_id"),
            CustomerFilter::AccountName => f.write_str("account_name"),
        }
    }
}

impl FromStr for CustomerFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "account_id" => Ok(CustomerFilter::AccountId),
            "account_name" => Ok(CustomerFilter::AccountName),
            other => Err(Error::validation(format!("Unknown filter type '{}'.", other))),
        }
    }
}

/// A customer reached through a Mapping Gateway that carries a virtual number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedCustomer {
    pub account_id: String,
    pub customer_name_on_vos: String,
    pub customer_name_in_mg: String,
    pub server_name: String,
    pub linked_via_mg_name: String,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl Fleet {
    /// Customers whose account id (or name) contains `text`, case-insensitively,
    /// sorted by server then account
    pub async fn search_customers(
        &self,
        filter: CustomerFilter,
        text: &str,
    ) -> FleetResults<CustomerSummary> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return FleetResults::default();
        }
        let needle = needle.as_str();

        let mut found = self
            .fan_out("Customer search", |vos, server| async move {
                let accounts = customers::list_accounts(vos, server).await?;
                let wanted: Vec<String> = match filter {
                    CustomerFilter::AccountId => accounts
                        .into_iter()
                        .filter(|a| contains_ci(a, needle))
                        .collect(),
                    CustomerFilter::AccountName => accounts,
                };

                let summaries: Vec<CustomerSummary> = customers::raw_customers(vos, server, &wanted)
                    .await?
                    .iter()
                    .map(|raw| CustomerSummary::from_raw(&server.name, raw))
                    .filter(|c| match filter {
                        CustomerFilter::AccountId => true,
                        CustomerFilter::AccountName => {
                            c.name.as_deref().map_or(false, |n| contains_ci(n, needle))
                        }
                    })
                    .collect();
                Ok(summaries)
            })
            .await;

        found.results.sort_by(|a, b| {
            (a.server_name.as_str(), a.account_id.as_str())
                .cmp(&(b.server_name.as_str(), b.account_id.as_str()))
        });
        found
    }

    /// Customers owning a Mapping Gateway whose caller prefixes contain `vn`.
    ///
    /// The MG's `account` is looked up and kept only when the customer's name
    /// matches the MG's `accountName`. Each account appears once per server.
    pub async fn customers_linked_to_virtual_number(
        &self,
        vn: &str,
    ) -> Result<FleetResults<LinkedCustomer>> {
        let vn = vn.trim();
        if vn.is_empty() {
            return Err(Error::validation("Virtual number key cannot be empty."));
        }

        Ok(self
            .fan_out("Linked customer lookup", |vos, server| async move {
                let mappings = gateways::fetch_all(vos, server, GatewayKind::Mapping).await?;

                // account -> (name in MG, MG name), first MG wins
                let mut candidates: BTreeMap<String, (String, String)> = BTreeMap::new();
                for mg in &mappings {
                    if !mg.prefixes(CALLOUT_CALLER_PREFIXES).iter().any(|p| p == vn) {
                        continue;
                    }
                    let account = mg.str_field("account");
                    let account_name = mg.str_field("accountName");
                    if account.is_empty() || account_name.is_empty() {
                        continue;
                    }
                    candidates
                        .entry(account.to_string())
                        .or_insert_with(|| (account_name.to_string(), mg.name().to_string()));
                }
                if candidates.is_empty() {
                    return Ok(Vec::new());
                }

                let accounts: Vec<String> = candidates.keys().cloned().collect();
                let raws = customers::raw_customers(vos, server, &accounts).await?;

                let mut seen = HashSet::new();
                let mut linked = Vec::new();
                for raw in &raws {
                    let summary = CustomerSummary::from_raw(&server.name, raw);
                    let Some((name_in_mg, mg_name)) = candidates.get(&summary.account_id) else {
                        continue;
                    };
                    let name_on_vos = summary.name.clone().unwrap_or_default();
                    if name_on_vos.to_lowercase() != name_in_mg.to_lowercase() {
                        continue;
                    }
                    if !seen.insert(summary.account_id.clone()) {
                        continue;
                    }
                    linked.push(LinkedCustomer {
                        account_id: summary.account_id,
                        customer_name_on_vos: name_on_vos,
                        customer_name_in_mg: name_in_mg.clone(),
                        server_name: server.name.clone(),
                        linked_via_mg_name: mg_name.clone(),
                    });
                }
                Ok(linked)
            })
            .await)
    }
}
