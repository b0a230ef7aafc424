//! JSON canónico: claves de objeto ordenadas, sin espacios.
//!
//! Se usa para derivar ids deterministas y para comparar volcados de
//! entidades entre backends byte a byte.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let mut tree = BTreeMap::new();
            for (k, v) in map {
                tree.insert(k, to_canonical_json(v));
            }
            let items: Vec<String> = tree.into_iter()
                                         .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v))
                                         .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

/// Serializa cualquier valor `Serialize` a JSON canónico.
pub fn canonical_dump<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(to_canonical_json(&serde_json::to_value(value)?))
}
