//! DraftBundle (etapa Production).

use serde::{Deserialize, Serialize};

use crate::entity::StageEntity;
use crate::error::DomainError;
use crate::ids::validate_logical_id;
use crate::text::validate_stored_text;
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: String,
    pub title: String,
    pub body: String,
}

/// Conjunto ordenado de assets producidos para una estrategia.
///
/// Invariante: el orden de `assets` se conserva idéntico en ambos backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftBundle {
    pub bundle_id: String,
    pub strategy_id: String,
    pub assets: Vec<Asset>,
}

impl StageEntity for DraftBundle {
    const STAGE: Stage = Stage::Production;
    const KIND: &'static str = "draft_bundle";

    fn entity_id(&self) -> &str {
        &self.bundle_id
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_logical_id("bundle_id", &self.bundle_id)?;
        validate_logical_id("strategy_id", &self.strategy_id)?;
        if self.assets.iter().any(|a| a.kind.trim().is_empty()) {
            return Err(DomainError::Validation("asset with empty kind".into()));
        }
        for a in &self.assets {
            validate_stored_text("asset.kind", &a.kind)?;
            validate_stored_text("asset.title", &a.title)?;
            validate_stored_text("asset.body", &a.body)?;
        }
        Ok(())
    }
}
