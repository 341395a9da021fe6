//! Work spread across every configured server
//!
//! Each server is queried concurrently. A server that fails becomes an entry
//! in `errors` and the others still contribute results.

pub mod cleanup;
pub mod customers;
pub mod numbers;
pub mod rules;

pub use customers::{CustomerFilter, LinkedCustomer};
pub use numbers::{NumberField, NumberFinding};
pub use rules::{RuleDefinition, VirtualNumberStatus};

use crate::core::config::{Config, ServerConfig};
use crate::core::error::Result;
use crate::rules::numbers::expand_all;
use crate::vos::client::VosClient;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// A server whose part of a fleet query failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFailure {
    pub server_name: String,
    pub message: String,
}

/// Merged results of a fleet query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetResults<T> {
    pub results: Vec<T>,
    pub errors: Vec<ServerFailure>,
}

impl<T> Default for FleetResults<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> FleetResults<T> {
    pub fn merge(mut self, other: FleetResults<T>) -> Self {
        self.results.extend(other.results);
        self.errors.extend(other.errors);
        self
    }
}

#[derive(Clone)]
pub struct Fleet {
    vos: VosClient,
    config: Arc<Config>,
}

impl Fleet {
    pub fn new(vos: VosClient, config: Arc<Config>) -> Self {
        Self { vos, config }
    }

    pub fn vos(&self) -> &VosClient {
        &self.vos
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn server(&self, name: &str) -> Result<&ServerConfig> {
        self.config.server(name)
    }

    /// Numbers to match for a set of operator inputs
    pub fn search_targets(&self, inputs: &[String]) -> BTreeSet<String> {
        if self.config.search.expand_variants {
            expand_all(inputs)
        } else {
            inputs
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        }
    }

    /// Run `job` against every server concurrently and merge the results.
    /// `label` prefixes failure messages.
    async fn fan_out<'a, T, F, Fut>(&'a self, label: &str, job: F) -> FleetResults<T>
    where
        F: Fn(&'a VosClient, &'a ServerConfig) -> Fut,
        Fut: Future<Output = Result<Vec<T>>> + 'a,
    {
        let runs = self.config.servers.iter().map(|server| {
            let fut = job(&self.vos, server);
            async move { (server, fut.await) }
        });

        let mut merged = FleetResults::default();
        for (server, outcome) in join_all(runs).await {
            match outcome {
                Ok(items) => merged.results.extend(items),
                Err(e) => {
                    warn!(server = %server.name, "{} failed: {}", label, e);
                    merged.errors.push(ServerFailure {
                        server_name: server.name.clone(),
                        message: format!("{} on {}: {}", label, server.name, e),
                    });
                }
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::config_for;

    #[test]
    fn test_search_targets_respects_expansion_setting() {
        let mut config = config_for(vec![]);
        let vos = VosClient::new(&config.vos).unwrap();
        let inputs = vec!["0912345678".to_string(), " ".to_string()];

        let fleet = Fleet::new(vos.clone(), Arc::new(config.clone()));
        assert_eq!(fleet.search_targets(&inputs).len(), 3);

        config.search.expand_variants = false;
        let fleet = Fleet::new(vos, Arc::new(config));
        let targets: Vec<String> = fleet.search_targets(&inputs).into_iter().collect();
        assert_eq!(targets, vec!["0912345678"]);
    }

    #[test]
    fn test_merge() {
        let a = FleetResults {
            results: vec![1],
            errors: vec![],
        };
        let b = FleetResults {
            results: vec![2],
            errors: vec![ServerFailure {
                server_name: "S2".to_string(),
                message: "down".to_string(),
            }],
        };
        let merged = a.merge(b);
        assert_eq!(merged.results, vec![1, 2]);
        assert_eq!(merged.errors.len(), 1);
    }
}
