//! Shared configuration, errors and concurrency tokens

pub mod config;
pub mod error;
pub mod hash;
