//! Los cinco pasos del pipeline, cada uno sobre el puerto de su etapa.

use std::sync::Arc;

use delivery_domain::Stage;

use super::{SagaContext, SagaStep};
use crate::errors::StageError;
use crate::port::{DeliveryPort, IntakePort, ProductionPort, QualityPort, StrategyPort};

pub struct IntakeStep(pub Arc<dyn IntakePort>);

impl SagaStep for IntakeStep {
    fn stage(&self) -> Stage {
        Stage::Intake
    }

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError> {
        self.0.normalize(ctx.run_id, ctx.payload)
    }

    fn compensate(&self, entity_id: &str) -> Result<(), StageError> {
        self.0.undo(entity_id)
    }
}

pub struct StrategyStep(pub Arc<dyn StrategyPort>);

impl SagaStep for StrategyStep {
    fn stage(&self) -> Stage {
        Stage::Strategy
    }

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError> {
        self.0.generate(ctx.entity_for(Stage::Intake)?)
    }

    fn compensate(&self, entity_id: &str) -> Result<(), StageError> {
        self.0.undo(entity_id)
    }
}

pub struct ProductionStep(pub Arc<dyn ProductionPort>);

impl SagaStep for ProductionStep {
    fn stage(&self) -> Stage {
        Stage::Production
    }

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError> {
        self.0.generate(ctx.entity_for(Stage::Strategy)?)
    }

    fn compensate(&self, entity_id: &str) -> Result<(), StageError> {
        self.0.undo(entity_id)
    }
}

/// Evalúa el draft; un resultado reprobado se convierte en `Rejected`.
pub struct QualityStep(pub Arc<dyn QualityPort>);

impl SagaStep for QualityStep {
    fn stage(&self) -> Stage {
        Stage::Quality
    }

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError> {
        let result = self.0.evaluate(ctx.entity_for(Stage::Production)?)?;
        if result.passed {
            return Ok(result.result_id);
        }
        let reason = if result.issues.is_empty() {
            format!("quality check failed with score {:.2}", result.score)
        } else {
            format!("quality check failed with score {:.2}: {}", result.score, result.issues.join("; "))
        };
        Err(StageError::Rejected { entity_id: result.result_id,
                                   reason })
    }

    fn compensate(&self, entity_id: &str) -> Result<(), StageError> {
        self.0.undo(entity_id)
    }
}

pub struct DeliveryStep(pub Arc<dyn DeliveryPort>);

impl SagaStep for DeliveryStep {
    fn stage(&self) -> Stage {
        Stage::Delivery
    }

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError> {
        self.0.package(ctx.entity_for(Stage::Production)?)
    }

    fn compensate(&self, entity_id: &str) -> Result<(), StageError> {
        self.0.undo(entity_id)
    }
}
