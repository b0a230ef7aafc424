use thiserror::Error;

/// Errores de validación del dominio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid logical id for {field}: {reason}")]
    InvalidLogicalId { field: &'static str, reason: String },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unknown stage: {0}")]
    UnknownStage(String),
}
