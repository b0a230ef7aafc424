//! Coordinador de la saga.
//!
//! Ejecuta los pasos en orden, persiste el run después de cada paso y, ante
//! cualquier falla, compensa en orden inverso sólo las entidades que este
//! run creó.

use std::sync::Arc;

use delivery_domain::{validate_logical_id, Stage};
use log::{debug, error, info, warn};
use serde_json::Value;

use super::steps::{DeliveryStep, IntakeStep, ProductionStep, QualityStep, StrategyStep};
use super::{SagaContext, SagaStep};
use crate::errors::{CompensationFailure, SagaError, StageError};
use crate::port::{DeliveryPort, IntakePort, ProductionPort, QualityPort, StrategyPort};
use crate::run::{FailureDetail, RunStatus, RunStore, WorkflowRun};

/// Los cinco puertos que consume el pipeline de producción.
#[derive(Clone)]
pub struct SagaPorts {
    pub intake: Arc<dyn IntakePort>,
    pub strategy: Arc<dyn StrategyPort>,
    pub production: Arc<dyn ProductionPort>,
    pub quality: Arc<dyn QualityPort>,
    pub delivery: Arc<dyn DeliveryPort>,
}

pub struct SagaCoordinator {
    runs: Arc<dyn RunStore>,
    steps: Vec<Box<dyn SagaStep>>,
}

impl SagaCoordinator {
    /// Pipeline estándar: Intake -> Strategy -> Production -> Quality ->
    /// Delivery.
    pub fn new(runs: Arc<dyn RunStore>, ports: SagaPorts) -> Self {
        let steps: Vec<Box<dyn SagaStep>> = vec![Box::new(IntakeStep(ports.intake)),
                                                 Box::new(StrategyStep(ports.strategy)),
                                                 Box::new(ProductionStep(ports.production)),
                                                 Box::new(QualityStep(ports.quality)),
                                                 Box::new(DeliveryStep(ports.delivery)),];
        Self::with_steps(runs, steps)
    }

    /// Coordinador sobre una lista arbitraria de pasos (en orden).
    pub fn with_steps(runs: Arc<dyn RunStore>, steps: Vec<Box<dyn SagaStep>>) -> Self {
        Self { runs, steps }
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.steps.iter().map(|s| s.stage()).collect()
    }

    /// Estado actual de un run, sin efectos.
    pub fn get_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, SagaError> {
        Ok(self.runs.find(run_id)?)
    }

    /// Ejecuta el run `run_id` de punta a punta.
    ///
    /// Si el run ya existe no se re-ejecuta nada: se devuelve su estado
    /// actual. Una falla de etapa o de escritura del run no es un `Err`: el run
    /// vuelve como FAILED con `failure_detail`. Sólo son `Err` un id inválido,
    /// un run store que no permite crear el run y un run que quedó
    /// inconsistente.
    pub fn execute(&self, run_id: &str, payload: &Value) -> Result<WorkflowRun, SagaError> {
        validate_logical_id("run_id", run_id).map_err(|e| SagaError::InvalidRunId(e.to_string()))?;

        let mut run = WorkflowRun::new(run_id);
        if let Some(existing) = self.runs.create_if_absent(&run)? {
            debug!("execute:{} already exists with status {}, skipping", run_id, existing.status);
            return outcome(existing);
        }
        info!("execute:{} started ({} stages)", run_id, self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let stage = step.stage();
            run.stage_cursor = index;
            debug!("execute:{} stage {} started", run_id, stage);

            let ctx = SagaContext { run_id,
                                    payload,
                                    completed: &run.context };
            match step.forward(&ctx) {
                Ok(entity_id) => {
                    run.record(stage, entity_id.clone());
                    run.stage_cursor = index + 1;
                    if let Err(e) = self.runs.save(&run) {
                        // La entidad ya está registrada: se compensa junto con las demás.
                        return self.fail(run, stage, StageError::Persistence(e));
                    }
                    debug!("execute:{} stage {} finished -> {}", run_id, stage, entity_id);
                }
                Err(e) => {
                    if let StageError::Rejected { entity_id, .. } = &e {
                        run.record(stage, entity_id.clone());
                    }
                    return self.fail(run, stage, e);
                }
            }
        }

        let mut done = run.clone();
        done.transition(RunStatus::Completed)?;
        if let Err(e) = self.runs.save(&done) {
            // Sin COMPLETED persistido no hay entrega: se deshace todo.
            let last = run.context.last().map(|r| r.stage).unwrap_or(Stage::Delivery);
            return self.fail(run, last, StageError::Persistence(e));
        }
        info!("execute:{} {}", run_id, done.status);
        Ok(done)
    }

    fn fail(&self, mut run: WorkflowRun, stage: Stage, cause: StageError) -> Result<WorkflowRun, SagaError> {
        warn!("execute:{} stage {} failed: {}", run.run_id, stage, cause);
        run.transition(RunStatus::Compensating)?;
        run.failure_detail = Some(FailureDetail::from_stage_error(stage, &cause));
        if let Err(e) = self.runs.save(&run) {
            error!("execute:{} could not persist COMPENSATING: {}", run.run_id, e);
        }

        let failures = self.compensate(&run);
        if let Some(detail) = run.failure_detail.as_mut() {
            detail.compensation_failures = failures;
        }

        run.transition(RunStatus::Failed)?;
        if let Err(e) = self.runs.save(&run) {
            error!("execute:{} could not persist FAILED: {}", run.run_id, e);
            if let Some(detail) = run.failure_detail.as_mut() {
                detail.run_store_error = Some(e.to_string());
            }
        }
        if run.is_inconsistent() {
            error!("execute:{} FAILED and inconsistent ({} compensation failure(s))",
                   run.run_id,
                   run.compensation_failures().len());
        } else {
            info!("execute:{} {}", run.run_id, run.status);
        }
        outcome(run)
    }

    /// Compensa el contexto del run del más reciente al más antiguo. Todas las
    /// compensaciones se intentan aunque alguna falle.
    fn compensate(&self, run: &WorkflowRun) -> Vec<CompensationFailure> {
        let mut failures = Vec::new();
        for record in run.context.iter().rev() {
            let Some(step) = self.steps.iter().find(|s| s.stage() == record.stage) else {
                failures.push(CompensationFailure { stage: record.stage,
                                                    entity_id: record.entity_id.clone(),
                                                    message: "no step registered for stage".into() });
                continue;
            };
            match step.compensate(&record.entity_id) {
                Ok(()) => debug!("compensate:{} {} {} undone", run.run_id, record.stage, record.entity_id),
                Err(e) => {
                    error!("compensate:{} {} {} failed: {}", run.run_id, record.stage, record.entity_id, e);
                    failures.push(CompensationFailure { stage: record.stage,
                                                        entity_id: record.entity_id.clone(),
                                                        message: e.to_string() });
                }
            }
        }
        failures
    }
}

fn outcome(run: WorkflowRun) -> Result<WorkflowRun, SagaError> {
    if run.is_inconsistent() {
        Err(SagaError::RunLeftInconsistent { run: Box::new(run) })
    } else {
        Ok(run)
    }
}
