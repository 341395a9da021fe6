//! Adding and replacing the real numbers behind one virtual key

use crate::rules::numbers::storage_form;
use crate::rules::rewrite::{RuleTarget, BLOCKED_SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Suffix of the key conventionally holding a backup list for `key`
pub const BACKUP_KEY_SUFFIX: &str = "bk";

/// How [`replace_reals`] combines the source numbers with the current ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    /// Append to the current numbers
    #[default]
    Merge,
    /// Discard the current numbers
    Overwrite,
}

pub fn backup_key(key: &str) -> String {
    format!("{key}{BACKUP_KEY_SUFFIX}")
}

/// Append real numbers to a key without overwriting it.
///
/// A blocked key counts as empty. Inputs are stored in [`storage_form`] and
/// the result keeps first occurrences only.
pub fn append_reals(current: Option<&RuleTarget>, new_reals: &[String]) -> Vec<String> {
    let existing = current.map(|t| t.reals().to_vec()).unwrap_or_default();
    let normalized = new_reals
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| storage_form(n));
    dedup(existing.into_iter().chain(normalized))
}

/// Build the target a key gets when numbers are copied in from a source key.
///
/// A blocked source contributes just `hetso`; otherwise the first `limit`
/// source numbers are taken. Merge appends them to the current numbers and
/// only ends up blocked when nothing routable remains and the source was
/// blocked. Returns `None` when the result would be empty.
pub fn replace_reals(
    current: Option<&RuleTarget>,
    source: &RuleTarget,
    limit: usize,
    mode: ReplaceMode,
) -> Option<RuleTarget> {
    let taken: Vec<String> = match source {
        RuleTarget::Blocked => vec![BLOCKED_SENTINEL.to_string()],
        RuleTarget::Reals(reals) => reals.iter().take(limit).cloned().collect(),
    };

    match mode {
        ReplaceMode::Overwrite => RuleTarget::from_reals(taken),
        ReplaceMode::Merge => {
            let existing = current.map(|t| t.reals().to_vec()).unwrap_or_default();
            let combined = dedup(
                existing
                    .into_iter()
                    .chain(taken)
                    .filter(|n| n != BLOCKED_SENTINEL),
            );
            if combined.is_empty() && source.is_blocked() {
                Some(RuleTarget::Blocked)
            } else {
                RuleTarget::from_reals(combined)
            }
        }
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|n| seen.insert(n.clone())).collect()
}
