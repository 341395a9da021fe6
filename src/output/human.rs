//! Human-readable output formatting

use crate::api::types::{GatewayDetails, MessageResponse, ServerEntry, VirtualNumberStatusResponse};
use crate::cleanup::{CleanupFinding, CleanupReport, TaskStatus};
use crate::fleet::{FleetResults, LinkedCustomer, NumberFinding, RuleDefinition};
use crate::rules::count_csv;
use crate::vos::customers::{CustomerDetails, CustomerSummary};
use crate::vos::record::{
    GatewayKind, CALLIN_CALLEE_PREFIXES, CALLIN_CALLER_PREFIXES, CALLOUT_CALLER_PREFIXES,
};

/// Plain-text rendering of a command result
pub trait Human {
    fn human(&self) -> String;
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Shared header and failed-server footer of every fleet result
fn fleet<T>(results: &FleetResults<T>, noun: &str, row: impl Fn(usize, &T) -> String) -> String {
    let mut output = String::new();

    if results.results.is_empty() {
        output.push_str(&format!("No {} found\n", noun));
    } else {
        output.push_str(&format!("Found {} {}\n\n", results.results.len(), noun));
        for (i, item) in results.results.iter().enumerate() {
            output.push_str(&row(i, item));
        }
    }

    if !results.errors.is_empty() {
        output.push('\n');
        for failure in &results.errors {
            output.push_str(&format!("! {}: {}\n", failure.server_name, failure.message));
        }
    }
    output
}

impl Human for MessageResponse {
    fn human(&self) -> String {
        format!("{}\n", self.message)
    }
}

impl Human for Vec<ServerEntry> {
    fn human(&self) -> String {
        if self.is_empty() {
            return "No servers configured\n".to_string();
        }
        self.iter().map(|s| format!("{}\n", s.name)).collect()
    }
}

impl Human for FleetResults<CustomerSummary> {
    fn human(&self) -> String {
        fleet(self, "customers", |i, c| {
            format!(
                "{}. [{}] {}  {}\n   balance {}  limit {}  {}\n",
                i + 1,
                c.server_name,
                c.account_id,
                or_dash(c.name.as_deref()),
                c.balance.map_or("-".to_string(), |b| format!("{:.2}", b)),
                c.credit_limit.map_or("-".to_string(), |l| l.to_string()),
                c.status
            )
        })
    }
}

impl Human for CustomerDetails {
    fn human(&self) -> String {
        let mut output = format!("{} on {}\n", self.account, self.server_name);
        let rows = [
            ("Name", self.name.clone()),
            ("Agent", self.agent_account.clone()),
            ("Rate group", self.fee_rate_group.clone()),
            ("Balance", self.money.map(|m| format!("{:.2}", m))),
            ("Credit limit", self.limit_money.map(|l| l.to_string())),
            ("Today", self.today_consumption.map(|m| format!("{:.2}", m))),
            ("Status", self.lock_type.map(|l| l.to_string())),
            ("Start", self.start_time_iso.clone()),
            ("Valid until", self.valid_time_iso.clone()),
            ("Memo", self.memo.clone()),
        ];
        for (label, value) in rows {
            output.push_str(&format!("  {:<13}{}\n", label, or_dash(value.as_deref())));
        }
        output.push_str(&format!("  {:<13}{}\n", "Hash", self.hash));
        output
    }
}

impl Human for Vec<GatewayDetails> {
    fn human(&self) -> String {
        if self.is_empty() {
            return "No gateways found\n".to_string();
        }
        let mut output = String::new();
        for (i, g) in self.iter().enumerate() {
            let state = if g.record.is_locked() { "locked" } else { "active" };
            let prefixes: usize = [CALLOUT_CALLER_PREFIXES, CALLIN_CALLER_PREFIXES]
                .iter()
                .map(|field| count_csv(g.record.str_field(field)))
                .sum();
            output.push_str(&format!(
                "{}. {} ({}, {} caller prefixes)\n",
                i + 1,
                g.record.name(),
                state,
                prefixes
            ));
        }
        output
    }
}

impl Human for GatewayDetails {
    fn human(&self) -> String {
        let mut output = format!("{}\n", self.record.name());
        for (key, value) in self.record.fields() {
            if key == "name" {
                continue;
            }
            let text = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            output.push_str(&format!("  {}: {}\n", key, truncate(&text, 100)));
        }
        output.push_str(&format!("  hash: {}\n", self.hash));
        output
    }
}

impl Human for FleetResults<RuleDefinition> {
    fn human(&self) -> String {
        fleet(self, "rule definitions", |i, d| {
            let target = if d.is_hetso {
                "hetso (blocked)".to_string()
            } else {
                format!("{} real(s): {}", d.real_numbers_count, truncate(&d.reals.join(";"), 80))
            };
            format!(
                "{}. {}  [{}] {}\n   {}\n",
                i + 1,
                d.virtual_key,
                d.server_name,
                d.rg_name,
                target
            )
        })
    }
}

impl Human for VirtualNumberStatusResponse {
    fn human(&self) -> String {
        let d = &self.definition;
        if d.is_hetso {
            format!("[{}] {}: blocked (hetso)\n", d.server_name, d.rg_name)
        } else {
            format!(
                "[{}] {}: {} real number(s)\n",
                d.server_name, d.rg_name, d.real_numbers_count
            )
        }
    }
}

impl Human for FleetResults<LinkedCustomer> {
    fn human(&self) -> String {
        fleet(self, "linked customers", |i, c| {
            format!(
                "{}. [{}] {}  {}\n   via {}\n",
                i + 1,
                c.server_name,
                c.account_id,
                c.customer_name_on_vos,
                c.linked_via_mg_name
            )
        })
    }
}

impl Human for FleetResults<NumberFinding> {
    fn human(&self) -> String {
        fleet(self, "matches", |i, f| {
            let mut row = format!(
                "{}. [{}] {} {}  {}\n   {}\n",
                i + 1,
                f.server_name,
                f.kind.short(),
                f.gateway_name,
                f.field,
                f.found_values.join(", ")
            );
            if let Some(key) = &f.rewrite_key {
                row.push_str(&format!("   under key {}\n", key));
            }
            row
        })
    }
}

impl Human for FleetResults<CleanupFinding> {
    fn human(&self) -> String {
        fleet(self, "gateways to clean", |i, finding| {
            let mut row = format!(
                "{}. [{}] {} {}  ({} match(es))\n",
                i + 1,
                finding.server_name(),
                finding.kind().short(),
                finding.name(),
                finding.match_count()
            );
            let mut line = |label: &str, values: &[String]| {
                if !values.is_empty() {
                    row.push_str(&format!("   {}: {}\n", label, values.join(", ")));
                }
            };
            match finding {
                CleanupFinding::Mapping(mg) => line(CALLOUT_CALLER_PREFIXES, &mg.common_in_caller),
                CleanupFinding::Routing(rg) => {
                    line(GatewayKind::Routing.caller_prefix_field(), &rg.common_in_caller);
                    line(CALLIN_CALLEE_PREFIXES, &rg.common_in_callee);
                    line("delete keys", &rg.virtual_keys_to_delete);
                    for (key, reals) in &rg.real_values_to_delete {
                        line(&format!("key {} drop", key), reals);
                    }
                }
            }
            row
        })
    }
}

impl Human for CleanupReport {
    fn human(&self) -> String {
        let mut output = String::new();
        for line in &self.execution_log {
            output.push_str(line);
            output.push('\n');
        }
        output.push_str(&format!(
            "\n{} succeeded, {} failed, {} skipped (run {})\n",
            self.count(TaskStatus::Success),
            self.count(TaskStatus::Failed),
            self.count(TaskStatus::Skipped),
            self.run_id
        ));
        output
    }
}
