//! Adaptadores de etapa: implementan los puertos del core sobre un
//! repositorio (inyectado) y un generador.

mod delivery;
mod intake;
mod production;
mod quality;
mod strategy;

pub use delivery::DeliveryAdapter;
pub use intake::IntakeAdapter;
pub use production::ProductionAdapter;
pub use quality::QualityAdapter;
pub use strategy::StrategyAdapter;

use delivery_core::{RepositoryError, StageError};
use delivery_domain::validate_logical_id;

/// Rechaza ids lógicos mal formados antes de tocar almacenamiento.
pub(crate) fn require_id(field: &'static str, value: &str) -> Result<(), StageError> {
    validate_logical_id(field, value).map_err(StageError::from)
}

/// Una entidad inválida es un error de validación; el resto, de persistencia.
pub(crate) fn storage(e: RepositoryError) -> StageError {
    match e {
        RepositoryError::Invalid(m) => StageError::Validation(m),
        other => StageError::Persistence(other),
    }
}

pub(crate) fn unknown(kind: &str, id: &str) -> StageError {
    StageError::Validation(format!("unknown {kind}: {id}"))
}
