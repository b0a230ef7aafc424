//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Variante testeable: `lookup` reemplaza a `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistenceError>
        where F: Fn(&str) -> Option<String>
    {
        let url = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty())
                                        .ok_or(PersistenceError::MissingDatabaseUrl)?;
        let min_connections = parse_size(&lookup, "DATABASE_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?;
        let max_connections = parse_size(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        Ok(Self { url,
                  min_connections,
                  max_connections })
    }
}

fn parse_size<F>(lookup: &F, key: &str, default: u32) -> Result<u32, PersistenceError>
    where F: Fn(&str) -> Option<String>
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim()
                        .parse()
                        .map_err(|_| PersistenceError::Config(format!("{key} must be a positive integer, got {raw:?}"))),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_sizes_are_missing() {
        let cfg = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/delivery")])).unwrap();
        assert_eq!(cfg.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn missing_url_or_bad_size_is_a_config_error() {
        assert!(matches!(DbConfig::from_lookup(lookup(&[])), Err(PersistenceError::MissingDatabaseUrl)));
        assert!(matches!(DbConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])), Err(PersistenceError::MissingDatabaseUrl)));
        let bad = lookup(&[("DATABASE_URL", "postgres://x"), ("DATABASE_MAX_CONNECTIONS", "many")]);
        assert!(matches!(DbConfig::from_lookup(bad), Err(PersistenceError::Config(_))));
    }
}
