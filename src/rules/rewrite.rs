//! Rewrite-rule codec
//!
//! VOS3000 stores a Routing Gateway's caller rewrite rules as one string:
//!
//! ```text
//! 100:111;222,200:hetso
//! ```
//!
//! Each comma-separated segment maps a virtual key to either the block
//! sentinel `hetso` or a semicolon-separated, ordered list of real numbers.
//! `,`, `;` and `:` are reserved; keys or numbers containing them cannot
//! round-trip.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Sentinel meaning "no route / blocked"
pub const BLOCKED_SENTINEL: &str = "hetso";

/// What a virtual key rewrites to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// The key is blocked (`hetso`)
    Blocked,
    /// Ordered real numbers; never empty and never exactly `["hetso"]`
    Reals(Vec<String>),
}

impl RuleTarget {
    /// Build a target from a list of numbers, folding `["hetso"]` into
    /// [`RuleTarget::Blocked`]. Entries are trimmed and blank ones dropped.
    /// Returns `None` when nothing is left.
    pub fn from_reals(reals: Vec<String>) -> Option<Self> {
        let reals: Vec<String> = reals
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        match reals.as_slice() {
            [] => None,
            [only] if only.eq_ignore_ascii_case(BLOCKED_SENTINEL) => Some(RuleTarget::Blocked),
            _ => Some(RuleTarget::Reals(reals)),
        }
    }

    fn parse_value(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case(BLOCKED_SENTINEL) {
            return Some(RuleTarget::Blocked);
        }
        let reals = value
            .split(';')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_reals(reals)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, RuleTarget::Blocked)
    }

    /// Real numbers this key routes to; empty when blocked
    pub fn reals(&self) -> &[String] {
        match self {
            RuleTarget::Blocked => &[],
            RuleTarget::Reals(reals) => reals,
        }
    }

    /// Real numbers other than a stray `hetso` entry
    pub fn routable_reals(&self) -> impl Iterator<Item = &String> {
        self.reals()
            .iter()
            .filter(|r| !r.eq_ignore_ascii_case(BLOCKED_SENTINEL))
    }

    /// Number of real numbers, zero when blocked
    pub fn real_count(&self) -> usize {
        self.reals().len()
    }

    /// The list form used in API payloads: `["hetso"]` when blocked
    pub fn to_list(&self) -> Vec<String> {
        match self {
            RuleTarget::Blocked => vec![BLOCKED_SENTINEL.to_string()],
            RuleTarget::Reals(reals) => reals.clone(),
        }
    }

    fn render(&self) -> String {
        match self {
            RuleTarget::Blocked => BLOCKED_SENTINEL.to_string(),
            RuleTarget::Reals(reals) => reals.join(";"),
        }
    }
}

/// Insertion-ordered mapping from virtual key to [`RuleTarget`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteRules {
    entries: Vec<(String, RuleTarget)>,
}

impl RewriteRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rule string.
    ///
    /// Segments without a colon, or with an empty key or value, are skipped
    /// without error. A repeated key keeps its first position and takes the
    /// last value.
    pub fn parse(input: &str) -> Self {
        let mut rules = Self::new();
        for segment in input.split(',') {
            let Some((key, value)) = segment.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            if let Some(target) = RuleTarget::parse_value(value) {
                rules.insert(key, target);
            }
        }
        rules
    }

    /// Render back to the VOS string form, in insertion order
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(key, target)| format!("{}:{}", key, target.render()))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn get(&self, key: &str) -> Option<&RuleTarget> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a key, keeping the existing position on replace.
    /// A `Reals(["hetso"])` target is stored as `Blocked`; an empty reals
    /// list removes the key.
    pub fn insert(&mut self, key: &str, target: RuleTarget) {
        let target = match target {
            RuleTarget::Reals(reals) => match RuleTarget::from_reals(reals) {
                Some(t) => t,
                None => {
                    self.remove(key);
                    return;
                }
            },
            blocked => blocked,
        };

        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = target,
            None => self.entries.push((key.to_string(), target)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<RuleTarget> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Drop the given real numbers from one key. The key disappears when no
    /// number is left. Returns true when anything was removed.
    pub fn remove_reals(&mut self, key: &str, numbers: &HashSet<&str>) -> bool {
        let Some(RuleTarget::Reals(reals)) = self.get(key) else {
            return false;
        };
        let kept: Vec<String> = reals
            .iter()
            .filter(|r| !numbers.contains(r.as_str()))
            .cloned()
            .collect();
        if kept.len() == reals.len() {
            return false;
        }
        self.insert(key, RuleTarget::Reals(kept));
        true
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleTarget)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RewriteRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Rules travel over JSON in their VOS string form so key order survives.
impl Serialize for RewriteRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&RewriteRules::serialize(self))
    }
}

impl<'de> Deserialize<'de> for RewriteRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RewriteRules::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn reals(items: &[&str]) -> RuleTarget {
        RuleTarget::Reals(items.iter().map(|s| s.to_string()).collect())
    }

    fn as_pairs(rules: &RewriteRules) -> BTreeMap<String, Vec<String>> {
        rules
            .iter()
            .map(|(k, t)| (k.to_string(), t.to_list()))
            .collect()
    }

    #[test]
    fn test_parse_keys_and_sentinel() {
        let rules = RewriteRules::parse("100:111;222,200:hetso");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("100"), Some(&reals(&["111", "222"])));
        assert_eq!(rules.get("200"), Some(&RuleTarget::Blocked));
        assert_eq!(rules.keys().collect::<Vec<_>>(), vec!["100", "200"]);
    }

    #[test]
    fn test_parse_drops_malformed_segments() {
        let rules = RewriteRules::parse("nocolon,:111,300:,400: ; ,500:9");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("500"), Some(&reals(&["9"])));
        assert!(RewriteRules::parse("").is_empty());
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let rules = RewriteRules::parse("1:a,2:b,1:c");
        assert_eq!(rules.serialize(), "1:c,2:b");
    }

    #[test]
    fn test_serialize_round_trip_is_set_equivalent() {
        for input in ["100:111;222,200:hetso", "7:1;1;2", "a:b", "x:hetso,y:hetso"] {
            let parsed = RewriteRules::parse(input);
            let reparsed = RewriteRules::parse(&parsed.serialize());
            assert_eq!(parsed, reparsed);
            assert_eq!(as_pairs(&parsed), as_pairs(&reparsed));
        }
    }

    #[test]
    fn test_single_hetso_real_serializes_bare() {
        let mut rules = RewriteRules::new();
        rules.insert("9", reals(&["hetso"]));
        assert_eq!(rules.get("9"), Some(&RuleTarget::Blocked));
        assert_eq!(rules.serialize(), "9:hetso");
    }

    #[test]
    fn test_remove_real_number_keeps_other_keys() {
        let mut rules = RewriteRules::parse("100:111;222,200:hetso");
        let targets: HashSet<&str> = ["111"].into_iter().collect();
        assert!(rules.remove_reals("100", &targets));
        assert_eq!(rules.serialize(), "100:222,200:hetso");
    }

    #[test]
    fn test_remove_last_real_drops_key() {
        let mut rules = RewriteRules::parse("100:111,200:333");
        let targets: HashSet<&str> = ["111"].into_iter().collect();
        assert!(rules.remove_reals("100", &targets));
        assert!(!rules.contains_key("100"));
        assert_eq!(rules.serialize(), "200:333");
    }

    #[test]
    fn test_remove_reals_down_to_hetso() {
        let mut rules = RewriteRules::parse("100:111;hetso");
        let targets: HashSet<&str> = ["111"].into_iter().collect();
        assert!(rules.remove_reals("100", &targets));
        assert_eq!(rules.serialize(), "100:hetso");
    }

    #[test]
    fn test_remove_reals_no_match() {
        let mut rules = RewriteRules::parse("100:111,200:hetso");
        let targets: HashSet<&str> = ["999"].into_iter().collect();
        assert!(!rules.remove_reals("100", &targets));
        assert!(!rules.remove_reals("200", &targets));
        assert!(!rules.remove_reals("missing", &targets));
    }

    #[test]
    fn test_sentinel_is_case_insensitive() {
        let rules = RewriteRules::parse("1:HETSO,2:Hetso,3:111");
        assert_eq!(rules.get("1"), Some(&RuleTarget::Blocked));
        assert_eq!(rules.get("2"), Some(&RuleTarget::Blocked));
        assert_eq!(rules.serialize(), "1:hetso,2:hetso,3:111");
    }

    #[test]
    fn test_blank_reals_never_reach_the_string() {
        assert_eq!(RuleTarget::from_reals(vec![String::new(), "  ".to_string()]), None);
        assert_eq!(
            RuleTarget::from_reals(vec!["a".to_string(), "".to_string(), " b ".to_string()]),
            Some(reals(&["a", "b"]))
        );

        let mut rules = RewriteRules::parse("100:111,200:222");
        rules.insert("100", reals(&[""]));
        assert_eq!(rules.serialize(), "200:222");

        rules.insert("200", reals(&["333", ""]));
        assert_eq!(rules.serialize(), "200:333");
    }

    #[test]
    fn test_json_uses_string_form() {
        let rules = RewriteRules::parse("2:b,1:a");
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(json, r#""2:b,1:a""#);
        let back: RewriteRules = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }
}
