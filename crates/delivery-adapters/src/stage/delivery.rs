use std::sync::Arc;

use delivery_core::{derive_id, DeliveryPort, ProductionPort, QualityPort, StageError, StageRepository};
use delivery_domain::{DeliveryPackage, StageEntity};
use log::debug;

use super::{require_id, storage, unknown};
use crate::generator::DeliveryGenerator;

pub struct DeliveryAdapter {
    repo: Arc<dyn StageRepository<DeliveryPackage>>,
    generator: Arc<dyn DeliveryGenerator>,
    production: Arc<dyn ProductionPort>,
    quality: Option<Arc<dyn QualityPort>>,
}

impl DeliveryAdapter {
    pub fn new(repo: Arc<dyn StageRepository<DeliveryPackage>>,
               generator: Arc<dyn DeliveryGenerator>,
               production: Arc<dyn ProductionPort>)
               -> Self {
        Self { repo,
               generator,
               production,
               quality: None }
    }

    /// Exige un QcResult aprobado para el draft antes de empaquetar.
    pub fn with_quality_gate(mut self, quality: Arc<dyn QualityPort>) -> Self {
        self.quality = Some(quality);
        self
    }
}

impl DeliveryPort for DeliveryAdapter {
    fn package(&self, draft_id: &str) -> Result<String, StageError> {
        require_id("draft_id", draft_id)?;
        let bundle = self.production
                         .find_bundle(draft_id)?
                         .ok_or_else(|| unknown("draft bundle", draft_id))?;
        if let Some(quality) = &self.quality {
            match quality.find_result_for_draft(draft_id)? {
                Some(r) if r.passed => {}
                Some(r) => return Err(StageError::Validation(format!("draft {draft_id} failed quality check {}", r.result_id))),
                None => return Err(StageError::Validation(format!("draft {draft_id} has no quality result"))),
            }
        }
        let package = DeliveryPackage { package_id: derive_id("pkg", &[draft_id]),
                                        draft_id: draft_id.to_string(),
                                        artifacts: self.generator.package(&bundle)? };
        package.validate()?;
        let id = self.repo.save(&package).map_err(storage)?;
        debug!("delivery:{} -> {} ({} artifacts)", draft_id, id, package.artifacts.len());
        Ok(id)
    }

    fn find_package(&self, package_id: &str) -> Result<Option<DeliveryPackage>, StageError> {
        require_id("package_id", package_id)?;
        self.repo.find(package_id).map_err(storage)
    }

    fn undo(&self, package_id: &str) -> Result<(), StageError> {
        require_id("package_id", package_id)?;
        self.repo.delete(package_id).map_err(storage)
    }
}
