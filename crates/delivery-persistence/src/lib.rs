//! delivery-persistence
//!
//! Backend relacional (Postgres vía Diesel) de los repositorios de etapa y
//! del run store del coordinador.
//!
//! Módulos:
//! - `pg`: pool, proveedor de conexiones y un repositorio por etapa.
//! - `migrations`: migraciones embebidas y harness de upgrade/downgrade.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel. Cada etapa es dueña de sus tablas; no hay
//!   claves foráneas entre etapas.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, ConnectionProvider, PgBriefRepository, PgDraftRepository, PgPackageRepository, PgPool,
             PgQcRepository, PgRunStore, PgStrategyRepository, PoolProvider};
