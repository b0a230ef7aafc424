use delivery_domain::Stage;
use serde_json::Value;

use crate::errors::StageError;
use crate::run::StageRecord;

/// Vista de sólo lectura que recibe cada paso forward.
///
/// `completed` contiene las entidades creadas por los pasos anteriores de
/// este mismo run, en orden de ejecución.
#[derive(Debug, Clone, Copy)]
pub struct SagaContext<'a> {
    pub run_id: &'a str,
    pub payload: &'a Value,
    pub completed: &'a [StageRecord],
}

impl<'a> SagaContext<'a> {
    /// Referencia lógica producida por `stage` en este run.
    pub fn entity_for(&self, stage: Stage) -> Result<&'a str, StageError> {
        self.completed
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.entity_id.as_str())
            .ok_or_else(|| StageError::Validation(format!("no {stage} entity recorded for run {}", self.run_id)))
    }
}

/// Un paso de la saga: operación forward más su compensación.
///
/// `forward` devuelve el id de la entidad creada. Si la entidad se creó pero
/// el resultado no permite continuar, debe devolver `StageError::Rejected`
/// con ese id para que también se compense.
pub trait SagaStep: Send + Sync {
    fn stage(&self) -> Stage;

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError>;

    /// Deshace exactamente `entity_id`. Debe ser idempotente.
    fn compensate(&self, entity_id: &str) -> Result<(), StageError>;
}
