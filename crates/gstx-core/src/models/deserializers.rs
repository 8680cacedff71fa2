//! Lenient deserializers for the extraction engine's loosely typed output.
//!
//! The engine is a language model behind an HTTP API, so any field may come
//! back as `null`, as a number where a string was expected, or as a marker
//! such as `"Not Clear"` where a number was expected. These helpers map every
//! unusable value to "absent" instead of failing the whole record.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional string, treating `null`, blanks and non-scalar
/// values as absent. Numbers and booleans are kept in their JSON text form
/// (HSN codes and GSTINs sometimes arrive as numbers).
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Deserialize a string that defaults to empty when absent or unusable.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(Option::unwrap_or_default)
}

/// Deserialize an optional decimal from a number or a numeric string.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_amount(&s),
        _ => None,
    })
}

/// Deserialize a decimal that defaults to zero when absent or unreadable.
pub fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_decimal(deserializer).map(Option::unwrap_or_default)
}

/// Deserialize a nested object, substituting the default for `null`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parse an amount string such as `"1,18,000.00"`, `"₹ 500"` or `"Rs. 42.5"`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('₹')
        .trim_start_matches("Rs.")
        .trim_start_matches("INR")
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    parse_decimal(&cleaned)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
