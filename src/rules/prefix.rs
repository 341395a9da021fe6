//! Comma-joined prefix lists and the add/delete reconciler

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static INPUT_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,;]+").expect("valid separator pattern"));

/// Split a stored prefix list on `,`. Entries are trimmed and empty ones
/// dropped, so a rewritten list never carries stray whitespace.
pub fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of non-empty entries in a stored prefix list
pub fn count_csv(csv: &str) -> usize {
    csv.split(',').filter(|p| !p.trim().is_empty()).count()
}

/// Split operator free text on commas, semicolons, whitespace and newlines
pub fn parse_number_input(text: &str) -> Vec<String> {
    INPUT_SEPARATORS
        .split(text)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixAction {
    Add,
    Delete,
}

/// Outcome of [`reconcile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    /// The new comma-joined list
    pub csv: String,
    /// False when the list is unchanged
    pub changed: bool,
    /// Numbers appended (Add)
    pub added: Vec<String>,
    /// Entries dropped (Delete)
    pub removed: Vec<String>,
}

/// Apply an add or delete to a stored prefix list.
///
/// Matching is exact string equality. Add appends numbers that are not yet
/// present, in input order. Delete keeps survivors in their original order.
pub fn reconcile(current_csv: &str, input: &[String], action: PrefixAction) -> Reconciled {
    let current = split_csv(current_csv);

    match action {
        PrefixAction::Add => {
            let mut present: HashSet<&str> = current.iter().map(String::as_str).collect();
            let mut added = Vec::new();
            for number in input {
                if present.insert(number.as_str()) {
                    added.push(number.clone());
                }
            }
            if added.is_empty() {
                return unchanged(current);
            }
            let mut next = current.clone();
            next.extend(added.iter().cloned());
            Reconciled {
                csv: next.join(","),
                changed: true,
                added,
                removed: Vec::new(),
            }
        }
        PrefixAction::Delete => {
            let remove: HashSet<&str> = input.iter().map(String::as_str).collect();
            let (removed, kept): (Vec<String>, Vec<String>) = current
                .iter()
                .cloned()
                .partition(|p| remove.contains(p.as_str()));
            if removed.is_empty() {
                return unchanged(current);
            }
            Reconciled {
                csv: kept.join(","),
                changed: true,
                added: Vec::new(),
                removed,
            }
        }
    }
}

fn unchanged(current: Vec<String>) -> Reconciled {
    Reconciled {
        csv: current.join(","),
        changed: false,
        added: Vec::new(),
        removed: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_nothing_is_unchanged() {
        let result = reconcile("a,b", &[], PrefixAction::Add);
        assert!(!result.changed);
        assert_eq!(result.csv, "a,b");
    }

    #[test]
    fn test_add_appends_only_new_numbers() {
        let result = reconcile("a,b", &nums(&["b", "d"]), PrefixAction::Add);
        assert!(result.changed);
        assert_eq!(result.csv, "a,b,d");
        assert_eq!(result.added, nums(&["d"]));
    }

    #[test]
    fn test_add_existing_only_is_unchanged() {
        let result = reconcile("a,b", &nums(&["a", "b"]), PrefixAction::Add);
        assert!(!result.changed);
    }

    #[test]
    fn test_add_skips_repeated_input() {
        let result = reconcile("", &nums(&["7", "7", "8"]), PrefixAction::Add);
        assert_eq!(result.csv, "7,8");
    }

    #[test]
    fn test_delete_preserves_order() {
        let result = reconcile("a,b,c", &nums(&["b"]), PrefixAction::Delete);
        assert!(result.changed);
        assert_eq!(result.csv, "a,c");
        assert_eq!(result.removed, nums(&["b"]));
    }

    #[test]
    fn test_delete_without_match_is_unchanged() {
        let result = reconcile("a,b,c", &nums(&["z"]), PrefixAction::Delete);
        assert!(!result.changed);
        assert_eq!(result.csv, "a,b,c");
    }

    #[test]
    fn test_no_numeric_normalization() {
        let result = reconcile("0912,84912", &nums(&["912"]), PrefixAction::Delete);
        assert!(!result.changed);
    }

    #[test]
    fn test_split_csv_discards_empty_segments() {
        assert_eq!(split_csv(",a,,b,"), nums(&["a", "b"]));
        assert_eq!(count_csv(",a,,b,"), 2);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn test_stored_entries_are_trimmed() {
        assert_eq!(split_csv("111, 222 ,333"), nums(&["111", "222", "333"]));

        let result = reconcile("111, 222", &nums(&["222"]), PrefixAction::Delete);
        assert!(result.changed);
        assert_eq!(result.csv, "111");

        let result = reconcile("111, 222", &nums(&["333"]), PrefixAction::Add);
        assert_eq!(result.csv, "111,222,333");
    }

    #[test]
    fn test_parse_number_input() {
        let parsed = parse_number_input("  111, 222\n333;444\t555 ,, ");
        assert_eq!(parsed, nums(&["111", "222", "333", "444", "555"]));
        assert!(parse_number_input("   \n").is_empty());
    }
}
