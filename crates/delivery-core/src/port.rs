//! Puertos de etapa.
//!
//! Cada etapa expone su operación forward, su compensación (`undo`,
//! idempotente) y lookups de sólo lectura sobre sus propias entidades. Las
//! demás etapas leen datos upstream exclusivamente a través de estos
//! lookups, nunca del repositorio ajeno.

use delivery_domain::{Brief, DeliveryPackage, DraftBundle, QcResult, Strategy};
use serde_json::Value;

use crate::errors::StageError;

pub trait IntakePort: Send + Sync {
    /// Normaliza la solicitud del cliente y persiste un `Brief`.
    fn normalize(&self, run_id: &str, payload: &Value) -> Result<String, StageError>;
    fn find_brief(&self, brief_id: &str) -> Result<Option<Brief>, StageError>;
    fn undo(&self, brief_id: &str) -> Result<(), StageError>;
}

pub trait StrategyPort: Send + Sync {
    fn generate(&self, brief_id: &str) -> Result<String, StageError>;
    fn find_strategy(&self, strategy_id: &str) -> Result<Option<Strategy>, StageError>;
    fn undo(&self, strategy_id: &str) -> Result<(), StageError>;
}

pub trait ProductionPort: Send + Sync {
    fn generate(&self, strategy_id: &str) -> Result<String, StageError>;
    fn find_bundle(&self, bundle_id: &str) -> Result<Option<DraftBundle>, StageError>;
    fn undo(&self, bundle_id: &str) -> Result<(), StageError>;
}

pub trait QualityPort: Send + Sync {
    /// Evalúa un draft. Un resultado con `passed=false` es un `Ok`; decidir
    /// si el pipeline continúa corresponde al coordinador.
    fn evaluate(&self, draft_id: &str) -> Result<QcResult, StageError>;
    fn find_result(&self, result_id: &str) -> Result<Option<QcResult>, StageError>;
    /// Resultado vigente para un draft.
    fn find_result_for_draft(&self, draft_id: &str) -> Result<Option<QcResult>, StageError>;
    fn undo(&self, result_id: &str) -> Result<(), StageError>;
}

pub trait DeliveryPort: Send + Sync {
    fn package(&self, draft_id: &str) -> Result<String, StageError>;
    fn find_package(&self, package_id: &str) -> Result<Option<DeliveryPackage>, StageError>;
    fn undo(&self, package_id: &str) -> Result<(), StageError>;
}
