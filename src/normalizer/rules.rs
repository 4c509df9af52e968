//! Generic rules applied by default and composed by every typed processor
//! (spec §4.5). Pure functions over `serde_json::Value` so they compose
//! freely and stay trivially idempotent.

use serde_json::{Map, Value};

const INTEGER_KEYS: &[&str] = &[
    "amount",
    "burst",
    "port",
    "depth",
    "priority",
    "statusCode",
    "attempts",
    "responseCode",
    "average",
    "weight",
    "percent",
];
const INTEGER_SUFFIXES: &[&str] = &["Seconds", "Limit", "Timeout", "Size"];

const REGEX_KEYS: &[&str] = &["regex", "replacement"];
const REGEX_SUFFIXES: &[&str] = &["Regex"];

const SECRET_KEYS: &[&str] = &["key", "token", "secret", "password"];
const SECRET_INFIXES: &[&str] = &["Key", "Token", "Secret", "Password"];

const HEADER_MAP_KEYS: &[&str] = &["customRequestHeaders", "customResponseHeaders"];

const BOOLEAN_PREFIXES: &[&str] = &["is", "has", "enable"];
const BOOLEAN_SUFFIXES: &[&str] = &["enabled"];
const BOOLEAN_EXACT_KEYS: &[&str] = &["permanent", "forceSlash"];

fn is_integer_key(key: &str) -> bool {
    INTEGER_KEYS.contains(&key) || INTEGER_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

fn is_regex_key(key: &str) -> bool {
    REGEX_KEYS.contains(&key) || REGEX_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.contains(&key) || SECRET_INFIXES.iter().any(|infix| key.contains(infix))
}

fn is_boolean_key(key: &str) -> bool {
    BOOLEAN_EXACT_KEYS.contains(&key)
        || BOOLEAN_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
        || BOOLEAN_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// Applies the generic rules recursively to every object in the tree.
/// Regex and secret keys are left untouched on purpose — they're already
/// strings and the rule is "preserve verbatim", there's nothing to coerce.
pub fn apply_generic(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(apply_generic_object(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(apply_generic).collect()),
        other => other,
    }
}

fn apply_generic_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let value = coerce_field(&key, value);
        out.insert(key, value);
    }
    out
}

fn coerce_field(key: &str, value: Value) -> Value {
    match value {
        Value::Number(number) if is_integer_key(key) => {
            if let Some(f) = number.as_f64() {
                if f.fract() == 0.0 && f.is_finite() {
                    return Value::Number(serde_json::Number::from(f as i64));
                }
            }
            Value::Number(number)
        }
        Value::String(s) if is_regex_key(key) || is_secret_key(key) => Value::String(s),
        Value::String(s) if is_boolean_key(key) => match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(s),
        },
        Value::Object(nested) if HEADER_MAP_KEYS.contains(&key) => {
            Value::Object(preserve_header_map(nested))
        }
        Value::Object(nested) => Value::Object(apply_generic_object(nested)),
        Value::Array(items) => Value::Array(items.into_iter().map(apply_generic).collect()),
        other => other,
    }
}

/// Header maps: empty-string values mean "remove this header" to the
/// proxy and must never be dropped or null-coerced during the round trip.
fn preserve_header_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(header, value)| match value {
            Value::String(s) => (header, Value::String(s)),
            other => (header, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integerizes_whole_number_floats_on_known_keys() {
        let input = json!({ "burst": 10.0, "average": 5.5 });
        let output = apply_generic(input);
        assert_eq!(output["burst"], json!(10));
        // not a whole number, left as-is even though "average" is an integer key
        assert_eq!(output["average"], json!(5.5));
    }

    #[test]
    fn integerizes_whole_number_weight_and_percent() {
        let input = json!({ "weight": 3.0, "percent": 10.0, "average": 10.0 });
        let output = apply_generic(input);
        assert_eq!(output["weight"], json!(3));
        assert_eq!(output["percent"], json!(10));
        assert_eq!(output["average"], json!(10));
    }

    #[test]
    fn preserves_empty_string_headers() {
        let input = json!({ "customRequestHeaders": { "X-Powered-By": "" } });
        let output = apply_generic(input);
        assert_eq!(output["customRequestHeaders"]["X-Powered-By"], json!(""));
    }

    #[test]
    fn coerces_string_booleans_on_enable_prefixed_keys() {
        let input = json!({ "enableFoo": "true", "forceSlash": "false" });
        let output = apply_generic(input);
        assert_eq!(output["enableFoo"], json!(true));
        assert_eq!(output["forceSlash"], json!(false));
    }

    #[test]
    fn is_idempotent() {
        let input = json!({ "burst": 10.0, "enableFoo": "true", "token": "" });
        let once = apply_generic(input.clone());
        let twice = apply_generic(once.clone());
        assert_eq!(once, twice);
    }
}
