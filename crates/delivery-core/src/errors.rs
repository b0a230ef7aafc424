//! Taxonomía de errores del núcleo.
//!
//! - `RepositoryError`: fallo de un repositorio de etapa o del run store.
//! - `StageError`: fallo de la operación forward/undo de una etapa. La
//!   variante `Rejected` representa un resultado de negocio negativo (QC con
//!   `passed=false`) y también dispara compensación.
//! - `CompensationFailure`: una compensación que falló; deja el run
//!   inconsistente.
//! - `SagaError`: lo único que `execute` devuelve como `Err`.

use delivery_domain::{DomainError, Stage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::run::WorkflowRun;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
    #[error("invalid entity: {0}")]
    Invalid(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound { entity: entity.to_string(),
                         id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageError {
    /// Entrada mal formada; se rechaza antes de cualquier escritura.
    #[error("validation: {0}")]
    Validation(String),
    /// Fallo del generador de contenido u otra falla de ejecución.
    #[error("stage execution: {0}")]
    Execution(String),
    /// Fallo de almacenamiento; para la saga equivale a `Execution`.
    #[error("persistence: {0}")]
    Persistence(#[from] RepositoryError),
    /// La etapa produjo `entity_id` pero su resultado no permite continuar.
    #[error("rejected {entity_id}: {reason}")]
    Rejected { entity_id: String, reason: String },
}

impl From<DomainError> for StageError {
    fn from(e: DomainError) -> Self {
        StageError::Validation(e.to_string())
    }
}

/// Clasificación persistida en `FailureDetail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    StageExecution,
    Persistence,
    QualityRejected,
}

pub fn classify_error(e: &StageError) -> ErrorClass {
    match e {
        StageError::Validation(_) => ErrorClass::Validation,
        StageError::Execution(_) => ErrorClass::StageExecution,
        StageError::Persistence(_) => ErrorClass::Persistence,
        StageError::Rejected { .. } => ErrorClass::QualityRejected,
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("compensation of {stage} entity {entity_id} failed: {message}")]
pub struct CompensationFailure {
    pub stage: Stage,
    pub entity_id: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SagaError {
    /// Una o más compensaciones fallaron, o el estado FAILED no pudo
    /// persistirse. Puede haber registros huérfanos: requiere intervención
    /// externa.
    #[error("run {} left inconsistent: {} compensation(s) failed", .run.run_id, .run.compensation_failures().len())]
    RunLeftInconsistent { run: Box<WorkflowRun> },
    #[error("invalid run id: {0}")]
    InvalidRunId(String),
    #[error("run store: {0}")]
    RunStore(#[from] RepositoryError),
    #[error("illegal run transition {from} -> {to}")]
    IllegalTransition { from: String, to: String },
}

impl SagaError {
    /// El run asociado, si el error lo transporta.
    pub fn run(&self) -> Option<&WorkflowRun> {
        match self {
            SagaError::RunLeftInconsistent { run } => Some(&**run),
            _ => None,
        }
    }
}
