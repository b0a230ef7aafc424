use std::sync::Arc;

use delivery_core::{derive_id, ProductionPort, StageError, StageRepository, StrategyPort};
use delivery_domain::{DraftBundle, StageEntity};
use log::debug;

use super::{require_id, storage, unknown};
use crate::generator::DraftGenerator;

pub struct ProductionAdapter {
    repo: Arc<dyn StageRepository<DraftBundle>>,
    generator: Arc<dyn DraftGenerator>,
    strategy: Arc<dyn StrategyPort>,
}

impl ProductionAdapter {
    pub fn new(repo: Arc<dyn StageRepository<DraftBundle>>, generator: Arc<dyn DraftGenerator>, strategy: Arc<dyn StrategyPort>) -> Self {
        Self { repo,
               generator,
               strategy }
    }
}

impl ProductionPort for ProductionAdapter {
    fn generate(&self, strategy_id: &str) -> Result<String, StageError> {
        require_id("strategy_id", strategy_id)?;
        let strategy = self.strategy
                           .find_strategy(strategy_id)?
                           .ok_or_else(|| unknown("strategy", strategy_id))?;
        let bundle = DraftBundle { bundle_id: derive_id("bundle", &[strategy_id]),
                                   strategy_id: strategy_id.to_string(),
                                   assets: self.generator.generate(&strategy)? };
        bundle.validate()?;
        let id = self.repo.save(&bundle).map_err(storage)?;
        debug!("production:{} -> {} ({} assets)", strategy_id, id, bundle.assets.len());
        Ok(id)
    }

    fn find_bundle(&self, bundle_id: &str) -> Result<Option<DraftBundle>, StageError> {
        require_id("bundle_id", bundle_id)?;
        self.repo.find(bundle_id).map_err(storage)
    }

    fn undo(&self, bundle_id: &str) -> Result<(), StageError> {
        require_id("bundle_id", bundle_id)?;
        self.repo.delete(bundle_id).map_err(storage)
    }
}
