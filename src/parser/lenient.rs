//! Lenient numeric parsing for KPI value strings
//!
//! Values in the metrics table are free-form strings such as `"4.25"`,
//! `"12,345"`, `"3.2%"` or `"$150,000"`. Parsing never fails: a string that
//! cannot be read as a number becomes `LenientValue::Unparseable`, and each
//! call site decides whether that means zero or a dropped row.

use serde::{Deserialize, Serialize};

/// Characters removed before parsing
const STRIPPED_CHARS: [char; 3] = ['%', ',', '$'];

/// Outcome of a lenient parse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LenientValue {
    Number(f64),
    Unparseable,
}

impl LenientValue {
    /// The parsed number, if any
    pub fn ok(self) -> Option<f64> {
        match self {
            LenientValue::Number(n) => Some(n),
            LenientValue::Unparseable => None,
        }
    }

    /// Silent-default policy: unparseable values read as 0.0
    pub fn or_zero(self) -> f64 {
        self.ok().unwrap_or(0.0)
    }

    pub fn is_parsed(self) -> bool {
        matches!(self, LenientValue::Number(_))
    }
}

/// Strip formatting characters and parse as f64
///
/// Non-finite results (`NaN`, `inf`) are treated as unparseable.
pub fn parse_lenient(raw: &str) -> LenientValue {
    let cleaned: String = raw.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    match cleaned.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => LenientValue::Number(n),
        _ => LenientValue::Unparseable,
    }
}

/// Extract a numeric KPI value, defaulting to 0.0 on any parse failure
pub fn extract(raw: &str) -> f64 {
    parse_lenient(raw).or_zero()
}
