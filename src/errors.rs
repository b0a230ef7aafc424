use delivery_core::{SagaError, StageError};
use delivery_persistence::PersistenceError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errores de la raíz de composición y de las consultas del `Pipeline`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuración inválida o incompleta: el pipeline no se construye.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("persistence startup: {0}")]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Saga(#[from] SagaError),
    #[error("stage lookup: {0}")]
    Stage(#[from] StageError),
    #[error("run not found: {0}")]
    RunNotFound(String),
    #[error("run {run_id} is {status}, not COMPLETED")]
    NotCompleted { run_id: String, status: String },
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
