//! Customer credit limits
//!
//! VOS3000 stores `limitMoney` as a number where `-1` means "unlimited".
//! Operators either set a new limit or move the current one up or down.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Wire value for an unlimited credit limit
pub const UNLIMITED_SENTINEL: i64 = -1;

const UNLIMITED_ALIASES: &[&str] = &["-1", "infinity", "unlimited", "không giới hạn"];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditError {
    #[error("Cannot add to or subtract from an unlimited credit limit.")]
    CannotModifyUnlimited,

    #[error("Credit limit cannot be negative.")]
    NegativeLimit,

    #[error("Amount cannot be negative.")]
    NegativeAmount,

    #[error("Credit limit is out of range.")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustMode {
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditLimit {
    Unlimited,
    Limited(i64),
}

impl CreditLimit {
    /// Interpret a raw `limitMoney` value (number or string).
    ///
    /// Fractional limits are truncated toward zero; negative values other
    /// than `-1` are not valid limits.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Self::from_number(n.as_f64()?),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim().to_lowercase();
        if UNLIMITED_ALIASES.contains(&s.as_str()) {
            return Some(CreditLimit::Unlimited);
        }
        Self::from_number(s.parse::<f64>().ok()?)
    }

    fn from_number(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        let whole = n.trunc();
        if whole == UNLIMITED_SENTINEL as f64 {
            return Some(CreditLimit::Unlimited);
        }
        if whole < 0.0 || whole > i64::MAX as f64 {
            return None;
        }
        Some(CreditLimit::Limited(whole as i64))
    }

    /// Value written back to VOS3000
    pub fn to_wire(self) -> i64 {
        match self {
            CreditLimit::Unlimited => UNLIMITED_SENTINEL,
            CreditLimit::Limited(n) => n,
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, CreditLimit::Unlimited)
    }
}

impl fmt::Display for CreditLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditLimit::Unlimited => f.write_str("Unlimited"),
            CreditLimit::Limited(n) => write!(f, "{}", n),
        }
    }
}

/// Sent as the VOS string form (`"-1"` or the amount), read from a number or string
impl Serialize for CreditLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire().to_string())
    }
}

impl<'de> Deserialize<'de> for CreditLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        CreditLimit::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid credit limit: {}", value)))
    }
}

/// Compute the new limit for an operator adjustment.
pub fn apply(current: CreditLimit, mode: AdjustMode, amount: i64) -> Result<CreditLimit, CreditError> {
    if amount < 0 {
        return Err(CreditError::NegativeAmount);
    }

    match (mode, current) {
        (AdjustMode::Set, _) => Ok(CreditLimit::Limited(amount)),
        (_, CreditLimit::Unlimited) => Err(CreditError::CannotModifyUnlimited),
        (AdjustMode::Add, CreditLimit::Limited(limit)) => limit
            .checked_add(amount)
            .map(CreditLimit::Limited)
            .ok_or(CreditError::Overflow),
        (AdjustMode::Subtract, CreditLimit::Limited(limit)) => {
            let next = limit - amount;
            if next < 0 {
                Err(CreditError::NegativeLimit)
            } else {
                Ok(CreditLimit::Limited(next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_to_unlimited_rejected() {
        assert_eq!(
            apply(CreditLimit::Unlimited, AdjustMode::Add, 100),
            Err(CreditError::CannotModifyUnlimited)
        );
        assert_eq!(
            apply(CreditLimit::Unlimited, AdjustMode::Subtract, 1),
            Err(CreditError::CannotModifyUnlimited)
        );
    }

    #[test]
    fn test_subtract_below_zero_rejected() {
        assert_eq!(
            apply(CreditLimit::Limited(500), AdjustMode::Subtract, 600),
            Err(CreditError::NegativeLimit)
        );
    }

    #[test]
    fn test_subtract_and_add() {
        assert_eq!(
            apply(CreditLimit::Limited(500), AdjustMode::Subtract, 200),
            Ok(CreditLimit::Limited(300))
        );
        assert_eq!(
            apply(CreditLimit::Limited(500), AdjustMode::Subtract, 500),
            Ok(CreditLimit::Limited(0))
        );
        assert_eq!(
            apply(CreditLimit::Limited(500), AdjustMode::Add, 250),
            Ok(CreditLimit::Limited(750))
        );
    }

    #[test]
    fn test_set_replaces_unlimited() {
        assert_eq!(
            apply(CreditLimit::Unlimited, AdjustMode::Set, 1000),
            Ok(CreditLimit::Limited(1000))
        );
        assert_eq!(
            apply(CreditLimit::Limited(5), AdjustMode::Set, -3),
            Err(CreditError::NegativeAmount)
        );
    }

    #[test]
    fn test_parse_wire_values() {
        assert_eq!(CreditLimit::from_value(&json!(-1)), Some(CreditLimit::Unlimited));
        assert_eq!(CreditLimit::from_value(&json!("-1")), Some(CreditLimit::Unlimited));
        assert_eq!(
            CreditLimit::from_value(&json!("Không giới hạn")),
            Some(CreditLimit::Unlimited)
        );
        assert_eq!(
            CreditLimit::from_value(&json!(1500.75)),
            Some(CreditLimit::Limited(1500))
        );
        assert_eq!(
            CreditLimit::from_value(&json!(" 200 ")),
            Some(CreditLimit::Limited(200))
        );
        assert_eq!(CreditLimit::from_value(&json!(-5)), None);
        assert_eq!(CreditLimit::from_value(&json!(null)), None);
        assert_eq!(CreditLimit::Unlimited.to_wire(), -1);
        assert_eq!(CreditLimit::Limited(42).to_string(), "42");
    }

    #[test]
    fn test_serde_uses_wire_string() {
        assert_eq!(serde_json::to_value(CreditLimit::Unlimited).unwrap(), json!("-1"));
        assert_eq!(serde_json::to_value(CreditLimit::Limited(300)).unwrap(), json!("300"));
        let limit: CreditLimit = serde_json::from_value(json!(750)).unwrap();
        assert_eq!(limit, CreditLimit::Limited(750));
        assert!(serde_json::from_value::<CreditLimit>(json!("-20")).is_err());
    }
}
