//! VOS3000 adapter: the web API client and per-server services

pub mod client;
pub mod customers;
pub mod gateways;
pub mod record;

pub use client::VosClient;
pub use customers::{CustomerDetails, CustomerSummary, LockStatus};
pub use record::{GatewayKind, GatewayRecord};
