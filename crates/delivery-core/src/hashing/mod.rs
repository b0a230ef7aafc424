//! Módulo de hashing y canonicalización JSON.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::{canonical_dump, to_canonical_json};
pub use hash::{derive_id, hash_str, hash_value};
