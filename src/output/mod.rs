//! Output formatting

pub mod human;
pub mod json;

use crate::cli::OutputFormat;
use serde::Serialize;

pub use human::Human;

/// Format any command result for output
pub fn format<T>(value: &T, format: OutputFormat) -> String
where
    T: Serialize + Human + ?Sized,
{
    match format {
        OutputFormat::Human => value.human(),
        OutputFormat::Json => json::format(value),
    }
}
