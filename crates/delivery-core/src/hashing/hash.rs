//! Hash helpers (blake3) y derivación de ids de entidad.

use blake3::Hasher;
use serde_json::Value;

use super::canonical_json::to_canonical_json;

/// Caracteres hex del hash que se conservan en un id derivado.
pub const DERIVED_ID_HASH_LEN: usize = 24;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash del JSON canónico de `value`.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Id determinista `<prefix>-<hash>` a partir de las referencias lógicas de
/// las que depende la entidad. Mismas partes ⇒ mismo id en cualquier backend.
pub fn derive_id(prefix: &str, parts: &[&str]) -> String {
    let digest = hash_value(&Value::from(parts.iter().map(|p| Value::from(*p)).collect::<Vec<_>>()));
    format!("{prefix}-{}", &digest[..DERIVED_ID_HASH_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_is_stable_and_prefixed() {
        let a = derive_id("brief", &["run-001"]);
        let b = derive_id("brief", &["run-001"]);
        assert_eq!(a, b);
        assert!(a.starts_with("brief-"));
        assert_eq!(a.len(), "brief-".len() + DERIVED_ID_HASH_LEN);
        assert_ne!(a, derive_id("brief", &["run-002"]));
    }

    #[test]
    fn part_boundaries_matter() {
        assert_ne!(derive_id("x", &["ab", "c"]), derive_id("x", &["a", "bc"]));
    }
}
