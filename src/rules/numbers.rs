//! Phone number forms used when searching and storing
//!
//! Numbers on the fleet are written inconsistently: national (`0912...`),
//! international without plus (`84912...`) or bare (`912...`). Searches match
//! every form of an input; storage keeps what the operator typed minus a
//! leading `+`.

use std::collections::BTreeSet;

const COUNTRY_CODE: &str = "84";
const TRUNK_PREFIX: &str = "0";
const MIN_BARE_NATIONAL_LEN: usize = 9;

/// All forms of one searched number.
///
/// Input that is not purely digits (after dropping a leading `+`) only
/// matches itself.
pub fn search_variants(input: &str) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return variants;
    }
    variants.insert(trimmed.to_string());

    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return variants;
    }
    variants.insert(digits.to_string());

    if let Some(rest) = digits.strip_prefix(COUNTRY_CODE).filter(|r| !r.is_empty()) {
        variants.insert(format!("{TRUNK_PREFIX}{rest}"));
        variants.insert(rest.to_string());
    } else if let Some(rest) = digits.strip_prefix(TRUNK_PREFIX).filter(|r| !r.is_empty()) {
        variants.insert(format!("{COUNTRY_CODE}{rest}"));
        variants.insert(rest.to_string());
    } else if digits.len() >= MIN_BARE_NATIONAL_LEN {
        variants.insert(format!("{TRUNK_PREFIX}{digits}"));
        variants.insert(format!("{COUNTRY_CODE}{digits}"));
    }

    variants
}

/// Union of the variants of every input
pub fn expand_all<'a, I>(inputs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    inputs
        .into_iter()
        .flat_map(|input| search_variants(input))
        .collect()
}

/// Inputs whose variants include `found`, for "which of my numbers matched"
pub fn originals_matching<'a>(found: &str, originals: &'a [String]) -> Vec<&'a str> {
    originals
        .iter()
        .filter(|orig| search_variants(orig).contains(found))
        .map(String::as_str)
        .collect()
}

/// Form a real number is written in when added to a rewrite rule
pub fn storage_form(input: &str) -> String {
    let trimmed = input.trim();
    trimmed.strip_prefix('+').unwrap_or(trimmed).to_string()
}

/// True for all-digit keys of exactly `digits` length
pub fn is_virtual_key_candidate(key: &str, digits: usize) -> bool {
    key.len() == digits && key.bytes().all(|b| b.is_ascii_digit())
}
