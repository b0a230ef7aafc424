use std::sync::Arc;

use delivery_core::{derive_id, IntakePort, StageError, StageRepository, StrategyPort};
use delivery_domain::{StageEntity, Strategy};
use log::debug;

use super::{require_id, storage, unknown};
use crate::generator::StrategyGenerator;

pub struct StrategyAdapter {
    repo: Arc<dyn StageRepository<Strategy>>,
    generator: Arc<dyn StrategyGenerator>,
    intake: Arc<dyn IntakePort>,
}

impl StrategyAdapter {
    pub fn new(repo: Arc<dyn StageRepository<Strategy>>, generator: Arc<dyn StrategyGenerator>, intake: Arc<dyn IntakePort>) -> Self {
        Self { repo,
               generator,
               intake }
    }
}

impl StrategyPort for StrategyAdapter {
    fn generate(&self, brief_id: &str) -> Result<String, StageError> {
        require_id("brief_id", brief_id)?;
        let brief = self.intake
                        .find_brief(brief_id)?
                        .ok_or_else(|| unknown("brief", brief_id))?;
        let draft = self.generator.generate(&brief)?;
        let strategy = Strategy { strategy_id: derive_id("strategy", &[brief_id]),
                                  brief_id: brief_id.to_string(),
                                  content: draft.content,
                                  tactic_assignments: draft.tactic_assignments };
        strategy.validate()?;
        let id = self.repo.save(&strategy).map_err(storage)?;
        debug!("strategy:{} -> {} ({} tactics)", brief_id, id, strategy.tactic_assignments.len());
        Ok(id)
    }

    fn find_strategy(&self, strategy_id: &str) -> Result<Option<Strategy>, StageError> {
        require_id("strategy_id", strategy_id)?;
        self.repo.find(strategy_id).map_err(storage)
    }

    fn undo(&self, strategy_id: &str) -> Result<(), StageError> {
        require_id("strategy_id", strategy_id)?;
        self.repo.delete(strategy_id).map_err(storage)
    }
}
