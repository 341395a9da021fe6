//! vosadmin control-plane HTTP API
//!
//! JSON over axum. Per-server routes live under `/servers/:server`; fleet-wide
//! searches and cleanup sit at the top level.

pub mod cleanup;
pub mod customers;
pub mod error;
pub mod gateways;
pub mod search;
pub mod server;

pub use server::{build_app, run, AppState};
