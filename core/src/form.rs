//! Form encoding for POST bodies.
//!
//! Bulletin expects `application/x-www-form-urlencoded` bodies, not JSON.
//! Subscriber data arrives as a JSON object so callers can pass custom
//! fields of any shape; this module flattens it into key/value pairs using
//! the bracket convention (`tags[]=a`, `meta[source]=web`) that form parsers
//! on the server side understand.

use serde_json::{Map, Value};

/// Subscriber fields keyed by name.
pub type FormData = Map<String, Value>;

pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Flatten `data` into ordered key/value pairs.
pub fn to_pairs(data: &FormData) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in data {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
}

/// Encode `data` as a form-urlencoded string.
pub fn encode(data: &FormData) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in to_pairs(data) {
        serializer.append_pair(&key, &value);
    }
    serializer.finish()
}

fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => out.push((key, String::new())),
        Value::Bool(b) => out.push((key, b.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s.clone())),
        Value::Array(items) => {
            for item in items {
                flatten(format!("{key}[]"), item, out);
            }
        }
        Value::Object(fields) => {
            for (sub, item) in fields {
                flatten(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}
