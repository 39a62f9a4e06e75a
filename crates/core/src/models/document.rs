use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw field map of a stored document, exactly as it crosses the gateway.
pub type Fields = serde_json::Map<String, Value>;

/// The three independent collections held by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "cards")]
    Cards,
    #[serde(rename = "supplies")]
    Supplies,
    #[serde(rename = "miscSupplies")]
    MiscSupplies,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Cards,
        Collection::Supplies,
        Collection::MiscSupplies,
    ];

    /// Collection name as used by the document store.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Cards => "cards",
            Collection::Supplies => "supplies",
            Collection::MiscSupplies => "miscSupplies",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored record: the id assigned by the store plus its untyped fields.
///
/// Typed records (`Card`, `Supply`, `MiscSupply`) are built from documents
/// through their `from_document` constructors, which never fail: malformed
/// values are coerced the same way form input is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// ── Coercion ────────────────────────────────────────────────────────

/// Parse a currency amount typed by the user.
///
/// Reads the leading decimal number (`"12.50 usd"` → 12.5). Anything that
/// does not start with a number, negatives and non-finite values yield 0.
#[must_use]
pub fn parse_amount(input: &str) -> f64 {
    let prefix = numeric_prefix(input.trim(), true);
    sanitize_amount(prefix.parse::<f64>().unwrap_or(0.0))
}

/// Parse a unit quantity typed by the user.
///
/// Reads the leading integer (`"3.7"` → 3). Invalid input and negatives yield 0.
#[must_use]
pub fn parse_quantity(input: &str) -> u32 {
    let prefix = numeric_prefix(input.trim(), false);
    prefix.parse::<i64>().map(clamp_quantity).unwrap_or(0)
}

/// Coerce a stored value into a non-negative amount.
#[must_use]
pub fn coerce_amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => sanitize_amount(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => parse_amount(s),
        _ => 0.0,
    }
}

/// Coerce a stored value into a non-negative quantity.
#[must_use]
pub fn coerce_quantity(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => clamp_quantity(i),
            None => {
                let f = n.as_f64().unwrap_or(0.0);
                if f.is_finite() && f > 0.0 {
                    f.trunc().min(f64::from(u32::MAX)) as u32
                } else {
                    0
                }
            }
        },
        Some(Value::String(s)) => parse_quantity(s),
        _ => 0,
    }
}

#[must_use]
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Coerce a stored ISO date. Empty strings and garbage are "no date".
/// Full timestamps are accepted and truncated to their calendar date.
#[must_use]
pub fn coerce_date(value: Option<&Value>) -> Option<NaiveDate> {
    let raw = match value {
        Some(Value::String(s)) => s.trim(),
        _ => return None,
    };
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Wire form of an optional date: `YYYY-MM-DD` or the empty string.
#[must_use]
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Non-negative finite amount, or 0.
#[must_use]
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn clamp_quantity(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Longest prefix of `input` that reads as a number, in the lenient style of
/// browser form parsing: optional sign, digits, and (for decimals) a fraction
/// and exponent. Returns `""` when no digit is found.
fn numeric_prefix(input: &str, decimal: bool) -> &str {
    let bytes = input.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }

    if decimal {
        if end < bytes.len() && bytes[end] == b'.' {
            let mut frac = end + 1;
            while frac < bytes.len() && bytes[frac].is_ascii_digit() {
                frac += 1;
            }
            if seen_digit || frac > end + 1 {
                seen_digit = true;
                end = frac;
            }
        }
        if seen_digit && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
            let mut exp = end + 1;
            if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
                exp += 1;
            }
            let exp_digits = exp;
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            if exp > exp_digits {
                end = exp;
            }
        }
    }

    if seen_digit {
        &input[..end]
    } else {
        ""
    }
}
