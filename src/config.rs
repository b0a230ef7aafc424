//! Configuración de la aplicación.
//!
//! Se lee una sola vez al construir el pipeline: modo de persistencia
//! (`DELIVERY_PERSISTENCE_MODE`) y, en modo relacional, la conexión
//! (`DATABASE_URL` + tamaños de pool).

use std::env;
use std::fmt;
use std::str::FromStr;

use delivery_persistence::{init_dotenv, DbConfig, PersistenceError};
use thiserror::Error;

pub const MODE_VAR: &str = "DELIVERY_PERSISTENCE_MODE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid DELIVERY_PERSISTENCE_MODE value {0:?} (expected 'transient' or 'relational')")]
    InvalidMode(String),
    #[error("relational persistence requires DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("invalid database configuration: {0}")]
    Database(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    #[default]
    Transient,
    Relational,
}

impl PersistenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceMode::Transient => "transient",
            PersistenceMode::Relational => "relational",
        }
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistenceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transient" | "memory" => Ok(PersistenceMode::Transient),
            "relational" | "postgres" => Ok(PersistenceMode::Relational),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mode: PersistenceMode,
    /// Presente sólo en modo relacional.
    pub database: Option<DbConfig>,
}

impl AppConfig {
    pub fn transient() -> Self {
        Self { mode: PersistenceMode::Transient,
               database: None }
    }

    /// Carga `.env` (una vez) y lee las variables del proceso.
    pub fn from_env() -> Result<Self, ConfigError> {
        init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let mode = match lookup(MODE_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => PersistenceMode::default(),
        };
        let database = match mode {
            PersistenceMode::Transient => None,
            PersistenceMode::Relational => Some(DbConfig::from_lookup(&lookup).map_err(|e| match e {
                                                                                   PersistenceError::MissingDatabaseUrl => ConfigError::MissingDatabaseUrl,
                                                                                   other => ConfigError::Database(other.to_string()),
                                                                               })?),
        };
        Ok(Self { mode, database })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn transient_is_the_default() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::transient());
    }

    #[test]
    fn relational_needs_a_database_url() {
        assert_matches!(AppConfig::from_lookup(lookup(&[(MODE_VAR, "relational")])), Err(ConfigError::MissingDatabaseUrl));
        assert_matches!(AppConfig::from_lookup(lookup(&[(MODE_VAR, "relational"), ("DATABASE_URL", " ")])),
                        Err(ConfigError::MissingDatabaseUrl));
        let cfg = AppConfig::from_lookup(lookup(&[(MODE_VAR, "Relational"), ("DATABASE_URL", "postgres://localhost/delivery")])).unwrap();
        assert_eq!(cfg.mode, PersistenceMode::Relational);
        assert_eq!(cfg.database.unwrap().max_connections, 16);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_matches!(AppConfig::from_lookup(lookup(&[(MODE_VAR, "sqlite")])), Err(ConfigError::InvalidMode(_)));
        assert_matches!(AppConfig::from_lookup(lookup(&[(MODE_VAR, "relational"),
                                                        ("DATABASE_URL", "postgres://x"),
                                                        ("DATABASE_MIN_CONNECTIONS", "-1")])),
                        Err(ConfigError::Database(_)));
    }
}
