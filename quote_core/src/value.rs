//! Scalar values carried by the descriptive info and fast snapshot maps.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rounding::round9;

/// One provider-supplied field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean flag.
    Bool(bool),
    /// Integral number (volumes, timestamps, share counts).
    Integer(i64),
    /// Floating number; rounded to 9 decimals once normalized.
    Number(f64),
    /// Free text.
    Text(String),
}

impl Scalar {
    /// Convert a JSON value. `null`, arrays and objects have no scalar form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Integer(i)),
                None => n.as_f64().map(Scalar::Number),
            },
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric view of the value, `None` for text, booleans and non-finite numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Textual view of the value, `None` unless it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Apply storage normalization: floats rounded to 9 decimals, non-finite
    /// floats dropped.
    pub fn normalized(self) -> Option<Self> {
        match self {
            Scalar::Number(n) if !n.is_finite() => None,
            Scalar::Number(n) => Some(Scalar::Number(round9(n))),
            other => Some(other),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_conversion_skips_null() {
        assert_eq!(Scalar::from_json(&json!(null)), None);
        assert_eq!(Scalar::from_json(&json!(12)), Some(Scalar::Integer(12)));
        assert_eq!(Scalar::from_json(&json!(1.5)), Some(Scalar::Number(1.5)));
        assert_eq!(Scalar::from_json(&json!("USD")), Some(Scalar::Text("USD".into())));
    }

    #[test]
    fn normalization_rounds_and_drops_nan() {
        assert_eq!(
            Scalar::Number(1.0000000004).normalized(),
            Some(Scalar::Number(1.0))
        );
        assert_eq!(Scalar::Number(f64::NAN).normalized(), None);
        assert_eq!(Scalar::Integer(7).normalized(), Some(Scalar::Integer(7)));
    }

    #[test]
    fn displays_in_natural_form() {
        assert_eq!(Scalar::Number(100.123456789).to_string(), "100.123456789");
        assert_eq!(Scalar::Integer(1200).to_string(), "1200");
        assert_eq!(Scalar::Text("New York".into()).to_string(), "New York");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
    }
}
