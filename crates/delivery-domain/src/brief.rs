//! Brief (etapa Intake): petición del cliente normalizada.

use serde::{Deserialize, Serialize};

use crate::entity::StageEntity;
use crate::error::DomainError;
use crate::ids::validate_logical_id;
use crate::text::validate_stored_text;
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    pub brief_id: String,
    /// Referencia lógica al run que lo creó.
    pub run_id: String,
    /// JSON canónico del payload normalizado.
    pub normalized_content: String,
}

impl Brief {
    pub fn new(brief_id: impl Into<String>,
               run_id: impl Into<String>,
               normalized_content: impl Into<String>)
               -> Result<Self, DomainError> {
        let brief = Self { brief_id: brief_id.into(),
                           run_id: run_id.into(),
                           normalized_content: normalized_content.into() };
        brief.validate()?;
        Ok(brief)
    }
}

impl StageEntity for Brief {
    const STAGE: Stage = Stage::Intake;
    const KIND: &'static str = "brief";

    fn entity_id(&self) -> &str {
        &self.brief_id
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_logical_id("brief_id", &self.brief_id)?;
        validate_logical_id("run_id", &self.run_id)?;
        if self.normalized_content.trim().is_empty() {
            return Err(DomainError::MissingField("normalized_content"));
        }
        validate_stored_text("normalized_content", &self.normalized_content)
    }
}
