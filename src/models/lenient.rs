//! Forgiving readers for numbers and lists arriving from form-style clients.
//!
//! Players and admin forms send numbers either as JSON numbers or as strings,
//! and lists either as arrays or as one comma separated string.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a JSON number or numeric string as `f64`; anything else is `None`
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// Reads a non-zero integer, truncating fractions ("1.5" -> 1)
///
/// Zero after truncation, empty and non-numeric values are `None`.
pub fn nonzero_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_f64)
        .map(f64::trunc)
        .filter(|n| *n != 0.0)
        .filter(|n| *n >= i32::MIN as f64 && *n <= i32::MAX as f64)
        .map(|n| n as i32))
}

/// Reads a string or number into a raw string for later parsing
pub fn raw_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Reads an array of strings or a comma separated string
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        Items(Vec<String>),
    }

    let items = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        Some(Raw::Items(items)) => items,
        None => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Parses the leading integer of a string, ignoring trailing garbage ("3rd" -> 3)
pub fn parse_int_prefix(input: &str) -> Option<i32> {
    let trimmed = input.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    if end == 0 {
        return None;
    }

    digits[..end]
        .parse::<i64>()
        .ok()
        .map(|n| n * sign)
        .and_then(|n| i32::try_from(n).ok())
}
