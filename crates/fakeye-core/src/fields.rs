//! Lenient field lookup over untyped backend payloads
//!
//! Every accessor walks an ordered list of aliases and returns the first one
//! that is present with a usable value. Wrong types count as absent, and a
//! non-object value simply has no fields.

use serde_json::Value;

/// First alias holding a non-blank string
pub fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
}

/// First alias holding a finite number, accepting numeric strings
pub fn first_number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(as_number)
}

pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Clamp into `[0, 1]`, mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(1.0)
}

/// Clamp into `[0, 100]` and round to the nearest integer
pub fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.max(0.0).min(100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_str_skips_blank_and_mistyped() {
        let value = json!({"a": "  ", "b": 3, "c": "found"});
        assert_eq!(first_str(&value, &["a", "b", "c"]), Some("found"));
        assert_eq!(first_str(&value, &["missing"]), None);
        assert_eq!(first_str(&json!("scalar"), &["a"]), None);
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let value = json!({"a": "abc", "b": " 42.5 ", "c": 7});
        assert_eq!(first_number(&value, &["a", "b", "c"]), Some(42.5));
        assert_eq!(first_number(&value, &["c"]), Some(7.0));
        assert_eq!(first_number(&json!({"a": "inf"}), &["a"]), None);
        assert_eq!(first_number(&json!({"a": null}), &["a"]), None);
    }

    #[test]
    fn clamps() {
        assert_eq!(clamp_percent(-20.0), 0);
        assert_eq!(clamp_percent(150.0), 100);
        assert_eq!(clamp_percent(74.5), 75);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.3), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
