//! Strategy (etapa Strategy).

use serde::{Deserialize, Serialize};

use crate::entity::StageEntity;
use crate::error::DomainError;
use crate::ids::validate_logical_id;
use crate::text::validate_stored_text;
use crate::stage::Stage;

/// Asignación de una táctica a un canal. El orden dentro de la estrategia es
/// significativo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticAssignment {
    pub channel: String,
    pub tactic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub strategy_id: String,
    pub brief_id: String,
    pub content: String,
    pub tactic_assignments: Vec<TacticAssignment>,
}

impl StageEntity for Strategy {
    const STAGE: Stage = Stage::Strategy;
    const KIND: &'static str = "strategy";

    fn entity_id(&self) -> &str {
        &self.strategy_id
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_logical_id("strategy_id", &self.strategy_id)?;
        validate_logical_id("brief_id", &self.brief_id)?;
        if self.content.trim().is_empty() {
            return Err(DomainError::MissingField("content"));
        }
        if self.tactic_assignments
               .iter()
               .any(|t| t.channel.trim().is_empty() || t.tactic.trim().is_empty())
        {
            return Err(DomainError::Validation("tactic assignment with empty channel or tactic".into()));
        }
        validate_stored_text("content", &self.content)?;
        for t in &self.tactic_assignments {
            validate_stored_text("tactic_assignment.channel", &t.channel)?;
            validate_stored_text("tactic_assignment.tactic", &t.tactic)?;
        }
        Ok(())
    }
}
