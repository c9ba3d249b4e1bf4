//! Attribute value model: ordered snapshots, key serialization, and the
//! float-safe comparison rule.

use serde_json::Value;

use crate::errors::ChangelogResult;

/// Ordered mapping from attribute name to value. Read-only input to the
/// engine, owned by the caller.
pub type Snapshot = serde_json::Map<String, Value>;

/// Serialize a primary key to the single string column a log entry stores.
/// Scalar keys keep their natural form; composite keys become one JSON array.
pub fn serialize_key(parts: &[Value]) -> ChangelogResult<String> {
    match parts {
        [single] => Ok(to_id_string(single).unwrap_or_default()),
        many => Ok(serde_json::to_string(many)?),
    }
}

/// Render a scalar value as an identifier string. `Null` yields `None`;
/// structured values fall back to their JSON encoding.
pub fn to_id_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Compare two values under the engine's comparison rule: both sides are
/// canonicalized first so equal numbers never diff on representation alone.
pub fn values_differ(a: &Value, b: &Value) -> bool {
    canonical(a) != canonical(b)
}

/// Canonical comparison form of a value. Numbers become their shortest
/// decimal string, and strings that read as float literals are reparsed to
/// the same form, so `1.50`, `1.5`, and the float `1.5` all compare equal.
/// Mirrors the loose comparison database-sourced attributes need, where a
/// column value may round-trip as either a number or a string.
pub fn canonical(value: &Value) -> Value {
    match value {
        // Integers format exactly; only true floats go through f64 so the
        // string form matches what a float-literal string reparses to.
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => Value::String(f.to_string()),
            None => value.clone(),
        },
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(s) if looks_like_float(s) => match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::String(f.to_string()),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Storage form of an attribute value: floating-point numbers are persisted
/// as their canonical string so the stored diff is representation-stable.
/// Everything else is stored as-is.
pub fn storage_form(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => Value::String(f.to_string()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

fn looks_like_float(s: &str) -> bool {
    s.contains('.') || s.contains('e') || s.contains('E')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn equal_floats_with_different_representation_do_not_differ() {
        assert!(!values_differ(&json!("1.50"), &json!("1.5")));
        assert!(!values_differ(&json!(1.5), &json!("1.5")));
        assert!(!values_differ(&json!(1.5), &json!("1.50")));
    }

    #[test]
    fn integers_and_their_string_forms_compare_equal() {
        assert!(!values_differ(&json!(30), &json!("30")));
        assert!(values_differ(&json!(30), &json!(31)));
    }

    #[test]
    fn non_numeric_strings_compare_verbatim() {
        assert!(values_differ(&json!("Bob"), &json!("Alice")));
        assert!(!values_differ(&json!("Bob"), &json!("Bob")));
        // Dotted strings that are not numbers stay untouched.
        assert!(values_differ(&json!("192.168.0.1"), &json!("192.168.0.2")));
    }

    #[test]
    fn null_differs_from_any_value() {
        assert!(values_differ(&Value::Null, &json!("x")));
        assert!(!values_differ(&Value::Null, &Value::Null));
    }

    #[test]
    fn storage_form_stringifies_floats_only() {
        assert_eq!(storage_form(&json!(1.5)), json!("1.5"));
        assert_eq!(storage_form(&json!(30)), json!(30));
        assert_eq!(storage_form(&json!("text")), json!("text"));
    }

    #[test]
    fn scalar_key_keeps_natural_form() {
        assert_eq!(serialize_key(&[json!(7)]).unwrap(), "7");
        assert_eq!(serialize_key(&[json!("abc")]).unwrap(), "abc");
    }

    #[test]
    fn composite_key_serializes_to_json() {
        assert_eq!(serialize_key(&[json!(1), json!("en")]).unwrap(), r#"[1,"en"]"#);
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent(f in proptest::num::f64::NORMAL) {
            let once = canonical(&json!(f));
            let twice = canonical(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn float_and_its_display_form_never_differ(f in proptest::num::f64::NORMAL) {
            let as_number = json!(f);
            let as_string = json!(f.to_string());
            prop_assert!(!values_differ(&as_number, &as_string));
        }
    }
}
