//! Operator side of the control-plane API
//!
//! `types` is shared with the server in `web`; `client` and `state` are what
//! the CLI talks through.

pub mod client;
pub mod state;
pub mod types;

pub use client::AdminClient;
pub use state::{LoadStatus, ServerContext, ServerDirectory, ViewScope};
