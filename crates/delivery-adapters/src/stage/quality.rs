use std::sync::Arc;

use delivery_core::{derive_id, ProductionPort, QualityPort, StageError, StageRepository};
use delivery_domain::{QcResult, StageEntity};
use log::{debug, info};

use super::{require_id, storage, unknown};
use crate::generator::QualityEvaluator;

pub struct QualityAdapter {
    repo: Arc<dyn StageRepository<QcResult>>,
    evaluator: Arc<dyn QualityEvaluator>,
    production: Arc<dyn ProductionPort>,
}

impl QualityAdapter {
    pub fn new(repo: Arc<dyn StageRepository<QcResult>>, evaluator: Arc<dyn QualityEvaluator>, production: Arc<dyn ProductionPort>) -> Self {
        Self { repo,
               evaluator,
               production }
    }

    fn result_id_for(draft_id: &str) -> String {
        derive_id("qc", &[draft_id])
    }
}

impl QualityPort for QualityAdapter {
    /// Persiste el resultado aunque repruebe: la saga lo compensa junto con
    /// el resto.
    fn evaluate(&self, draft_id: &str) -> Result<QcResult, StageError> {
        require_id("draft_id", draft_id)?;
        let bundle = self.production
                         .find_bundle(draft_id)?
                         .ok_or_else(|| unknown("draft bundle", draft_id))?;
        let eval = self.evaluator.evaluate(&bundle)?;
        let result = QcResult { result_id: Self::result_id_for(draft_id),
                                draft_id: draft_id.to_string(),
                                passed: eval.passed,
                                score: eval.score,
                                issues: eval.issues };
        result.validate()?;
        self.repo.save(&result).map_err(storage)?;
        if result.passed {
            debug!("quality:{} -> {} passed (score {:.2})", draft_id, result.result_id, result.score);
        } else {
            info!("quality:{} -> {} rejected (score {:.2})", draft_id, result.result_id, result.score);
        }
        Ok(result)
    }

    fn find_result(&self, result_id: &str) -> Result<Option<QcResult>, StageError> {
        require_id("result_id", result_id)?;
        self.repo.find(result_id).map_err(storage)
    }

    fn find_result_for_draft(&self, draft_id: &str) -> Result<Option<QcResult>, StageError> {
        require_id("draft_id", draft_id)?;
        let found = self.repo
                        .find(&Self::result_id_for(draft_id))
                        .map_err(storage)?;
        Ok(found.filter(|r| r.draft_id == draft_id))
    }

    fn undo(&self, result_id: &str) -> Result<(), StageError> {
        require_id("result_id", result_id)?;
        self.repo.delete(result_id).map_err(storage)
    }
}
