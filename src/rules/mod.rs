//! Gateway configuration rules: prefix lists, rewrite rules, number forms

pub mod merge;
pub mod numbers;
pub mod prefix;
pub mod rewrite;

pub use merge::{append_reals, backup_key, replace_reals, ReplaceMode};
pub use prefix::{count_csv, parse_number_input, reconcile, split_csv, PrefixAction, Reconciled};
pub use rewrite::{RewriteRules, RuleTarget, BLOCKED_SENTINEL};
