use std::sync::Arc;

use delivery_core::{derive_id, IntakePort, StageError, StageRepository};
use delivery_domain::Brief;
use log::debug;
use serde_json::Value;

use super::{require_id, storage};
use crate::generator::IntakeNormalizer;

pub struct IntakeAdapter {
    repo: Arc<dyn StageRepository<Brief>>,
    normalizer: Arc<dyn IntakeNormalizer>,
}

impl IntakeAdapter {
    pub fn new(repo: Arc<dyn StageRepository<Brief>>, normalizer: Arc<dyn IntakeNormalizer>) -> Self {
        Self { repo, normalizer }
    }
}

impl IntakePort for IntakeAdapter {
    fn normalize(&self, run_id: &str, payload: &Value) -> Result<String, StageError> {
        require_id("run_id", run_id)?;
        let content = self.normalizer.normalize(run_id, payload)?;
        let brief = Brief::new(derive_id("brief", &[run_id]), run_id, content)?;
        let id = self.repo.save(&brief).map_err(storage)?;
        debug!("intake:{} -> {}", run_id, id);
        Ok(id)
    }

    fn find_brief(&self, brief_id: &str) -> Result<Option<Brief>, StageError> {
        require_id("brief_id", brief_id)?;
        self.repo.find(brief_id).map_err(storage)
    }

    fn undo(&self, brief_id: &str) -> Result<(), StageError> {
        require_id("brief_id", brief_id)?;
        self.repo.delete(brief_id).map_err(storage)
    }
}
