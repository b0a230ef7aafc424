//! DeliveryPackage (etapa Delivery).
//!
//! `artifacts` es el único dato que se entrega a la capa de export/manifest
//! una vez que el run queda COMPLETED.

use serde::{Deserialize, Serialize};

use crate::entity::StageEntity;
use crate::error::DomainError;
use crate::ids::validate_logical_id;
use crate::text::validate_stored_text;
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryArtifact {
    pub name: String,
    pub url: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPackage {
    pub package_id: String,
    pub draft_id: String,
    pub artifacts: Vec<DeliveryArtifact>,
}

impl StageEntity for DeliveryPackage {
    const STAGE: Stage = Stage::Delivery;
    const KIND: &'static str = "delivery_package";

    fn entity_id(&self) -> &str {
        &self.package_id
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_logical_id("package_id", &self.package_id)?;
        validate_logical_id("draft_id", &self.draft_id)?;
        for a in &self.artifacts {
            if a.name.trim().is_empty() {
                return Err(DomainError::MissingField("artifact.name"));
            }
            if a.format.trim().is_empty() {
                return Err(DomainError::MissingField("artifact.format"));
            }
            validate_stored_text("artifact.name", &a.name)?;
            validate_stored_text("artifact.url", &a.url)?;
            validate_stored_text("artifact.format", &a.format)?;
        }
        Ok(())
    }
}
