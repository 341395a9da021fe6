//! Fleet-wide cleanup scan

use crate::cleanup::{scan_mapping, scan_routing, CleanupFinding};
use crate::core::error::{Error, Result};
use crate::fleet::{Fleet, FleetResults};
use crate::vos::gateways;
use crate::vos::record::GatewayKind;

impl Fleet {
    /// Scan every Mapping and Routing Gateway for the given numbers.
    ///
    /// Read-only. A server whose MG list fails can still report RG findings
    /// and vice versa.
    pub async fn cleanup_scan(&self, numbers: &[String]) -> Result<FleetResults<CleanupFinding>> {
        let targets = self.search_targets(numbers);
        if targets.is_empty() {
            return Err(Error::validation(
                "Payload must contain a 'numbers' list to check.",
            ));
        }
        let targets = &targets;
        let key_digits = self.config().cleanup.virtual_key_digits;

        let mappings = self.fan_out("Cleanup scan (MG)", |vos, server| async move {
            Ok(gateways::fetch_all(vos, server, GatewayKind::Mapping)
                .await?
                .iter()
                .filter_map(|mg| scan_mapping(&server.name, mg, targets))
                .collect::<Vec<CleanupFinding>>())
        });
        let routings = self.fan_out("Cleanup scan (RG)", |vos, server| async move {
            Ok(gateways::fetch_all(vos, server, GatewayKind::Routing)
                .await?
                .iter()
                .filter_map(|rg| scan_routing(&server.name, rg, targets, key_digits))
                .collect::<Vec<CleanupFinding>>())
        });

        let (mappings, routings) = futures::join!(mappings, routings);
        let mut found = mappings.merge(routings);
        found.results.sort_by(|a, b| {
            (a.server_name(), a.kind().short(), a.name())
                .cmp(&(b.server_name(), b.kind().short(), b.name()))
        });
        Ok(found)
    }
}
