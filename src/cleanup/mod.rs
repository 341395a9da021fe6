//! Bulk removal of numbers from gateway configuration
//!
//! A cleanup is two-phase: scanning is read-only and reports every gateway
//! that references a target number; the operator then picks findings, each
//! is planned into a full corrected payload, and the batch is executed.

pub mod execute;
pub mod plan;
pub mod scan;

pub use execute::{execute, CleanupReport, TaskOutcome, TaskStatus};
pub use plan::{plan, CleanupTask};
pub use scan::{scan_mapping, scan_routing, CleanupFinding, MappingFinding, RoutingFinding};
