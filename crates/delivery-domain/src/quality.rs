//! QcResult (etapa Quality).

use serde::{Deserialize, Serialize};

use crate::entity::StageEntity;
use crate::error::DomainError;
use crate::ids::validate_logical_id;
use crate::text::validate_stored_text;
use crate::stage::Stage;

/// Resultado de evaluación de calidad de un draft.
///
/// Como mucho existe un resultado vigente por `draft_id`: re-evaluar
/// reemplaza, nunca acumula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcResult {
    pub result_id: String,
    pub draft_id: String,
    pub passed: bool,
    pub score: f64,
    pub issues: Vec<String>,
}

impl StageEntity for QcResult {
    const STAGE: Stage = Stage::Quality;
    const KIND: &'static str = "qc_result";

    fn entity_id(&self) -> &str {
        &self.result_id
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_logical_id("result_id", &self.result_id)?;
        validate_logical_id("draft_id", &self.draft_id)?;
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Err(DomainError::Validation(format!("score out of range: {}", self.score)));
        }
        for issue in &self.issues {
            validate_stored_text("issue", issue)?;
        }
        Ok(())
    }

    fn replacement_key(&self) -> Option<&str> {
        Some(&self.draft_id)
    }
}
