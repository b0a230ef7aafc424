//! deliveryflow
//!
//! Pipeline de entrega de campañas en cinco etapas (intake, strategy,
//! production, quality, delivery) coordinado como saga:
//! - `config` lee el modo de persistencia y la conexión una sola vez.
//! - `composition` es la raíz de composición: construye repositorios,
//!   adaptadores y el coordinador, y expone el `Pipeline` cableado.
//!
//! Los crates `delivery-*` contienen el dominio, el coordinador, la
//! persistencia relacional y los adaptadores de etapa.

pub mod composition;
pub mod config;
pub mod errors;

pub use composition::{build_pipeline, build_pipeline_with, Generators, Pipeline, StageRepositories};
pub use config::{AppConfig, ConfigError, PersistenceMode, MODE_VAR};
pub use errors::PipelineError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_messages() {
        let e = PipelineError::NotCompleted { run_id: "run-1".into(),
                                              status: "FAILED".into() };
        assert_eq!(e.to_string(), "run run-1 is FAILED, not COMPLETED");
        let c: PipelineError = ConfigError::MissingDatabaseUrl.into();
        assert_eq!(c.to_string(), "configuration: relational persistence requires DATABASE_URL");
    }
}
