//! vosadmin - VOS3000 fleet administration
//!
//! A control-plane HTTP API in front of several VOS3000 softswitch servers,
//! plus the operator CLI that drives it: customer credit and lock status,
//! gateway prefix lists and rewrite rules, fleet-wide number search and
//! bulk cleanup.

pub mod api;
pub mod cleanup;
pub mod cli;
pub mod core;
pub mod credit;
pub mod fleet;
pub mod output;
pub mod rules;
pub mod vos;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
