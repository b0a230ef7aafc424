//! Raíz de composición.
//!
//! Único lugar que construye repositorios para el cableado de producción: lee
//! la configuración una vez, elige el backend para las cinco etapas y el run
//! store, construye los adaptadores y un coordinador. Los consumidores sólo
//! reciben capacidades como objetos de trait.

use std::sync::Arc;

use delivery_adapters::{CanonicalIntakeNormalizer, DeliveryAdapter, DeliveryGenerator, DraftGenerator, IntakeAdapter, IntakeNormalizer,
                        ProductionAdapter, QualityAdapter, QualityEvaluator, RubricQualityEvaluator, StrategyAdapter, StrategyGenerator,
                        TemplateDeliveryGenerator, TemplateDraftGenerator, TemplateStrategyGenerator};
use delivery_core::repo::{InMemoryBriefRepository, InMemoryDraftRepository, InMemoryPackageRepository, InMemoryQcRepository,
                          InMemoryStrategyRepository};
use delivery_core::{canonical_dump, InMemoryRunStore, RunStatus, RunStore, SagaCoordinator, SagaError, SagaPorts, StageRepository,
                    WorkflowRun};
use delivery_domain::{Brief, DeliveryArtifact, DeliveryPackage, DraftBundle, QcResult, Stage, Strategy};
use delivery_persistence::pg::{build_pool, PgBriefRepository, PgDraftRepository, PgPackageRepository, PgPool, PgQcRepository,
                               PgRunStore, PgStrategyRepository, PoolProvider};
use log::info;
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::config::{AppConfig, ConfigError, PersistenceMode};
use crate::errors::PipelineError;

/// Generadores de contenido, uno por etapa.
#[derive(Clone)]
pub struct Generators {
    pub normalizer: Arc<dyn IntakeNormalizer>,
    pub strategy: Arc<dyn StrategyGenerator>,
    pub draft: Arc<dyn DraftGenerator>,
    pub evaluator: Arc<dyn QualityEvaluator>,
    pub delivery: Arc<dyn DeliveryGenerator>,
}

impl Default for Generators {
    fn default() -> Self {
        Self { normalizer: Arc::new(CanonicalIntakeNormalizer),
               strategy: Arc::new(TemplateStrategyGenerator::default()),
               draft: Arc::new(TemplateDraftGenerator),
               evaluator: Arc::new(RubricQualityEvaluator::default()),
               delivery: Arc::new(TemplateDeliveryGenerator::default()) }
    }
}

/// Repositorios de las cinco etapas más el run store, todos del mismo
/// backend.
#[derive(Clone)]
pub struct StageRepositories {
    pub briefs: Arc<dyn StageRepository<Brief>>,
    pub strategies: Arc<dyn StageRepository<Strategy>>,
    pub drafts: Arc<dyn StageRepository<DraftBundle>>,
    pub results: Arc<dyn StageRepository<QcResult>>,
    pub packages: Arc<dyn StageRepository<DeliveryPackage>>,
    pub runs: Arc<dyn RunStore>,
}

impl StageRepositories {
    pub fn transient() -> Self {
        Self { briefs: Arc::new(InMemoryBriefRepository::new()),
               strategies: Arc::new(InMemoryStrategyRepository::new()),
               drafts: Arc::new(InMemoryDraftRepository::new()),
               results: Arc::new(InMemoryQcRepository::new()),
               packages: Arc::new(InMemoryPackageRepository::new()),
               runs: Arc::new(InMemoryRunStore::new()) }
    }

    /// Todas las etapas comparten el pool; cada repositorio escribe sólo sus
    /// tablas.
    pub fn relational(pool: PgPool) -> Self {
        let provider = PoolProvider { pool };
        Self { briefs: Arc::new(PgBriefRepository::new(provider.clone())),
               strategies: Arc::new(PgStrategyRepository::new(provider.clone())),
               drafts: Arc::new(PgDraftRepository::new(provider.clone())),
               results: Arc::new(PgQcRepository::new(provider.clone())),
               packages: Arc::new(PgPackageRepository::new(provider.clone())),
               runs: Arc::new(PgRunStore::new(provider)) }
    }
}

/// Construye el pipeline con los generadores por defecto.
pub fn build_pipeline(config: &AppConfig) -> Result<Pipeline, PipelineError> {
    build_pipeline_with(config, Generators::default())
}

pub fn build_pipeline_with(config: &AppConfig, generators: Generators) -> Result<Pipeline, PipelineError> {
    let repos = match config.mode {
        PersistenceMode::Transient => StageRepositories::transient(),
        PersistenceMode::Relational => {
            let db = config.database.as_ref().ok_or(ConfigError::MissingDatabaseUrl)?;
            let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
            StageRepositories::relational(pool)
        }
    };
    info!("pipeline wired with {} persistence", config.mode);
    Ok(Pipeline::wire(config.mode, repos, generators))
}

/// Instancia cableada: coordinador + puertos de etapa. Inmutable tras la
/// construcción.
pub struct Pipeline {
    mode: PersistenceMode,
    coordinator: SagaCoordinator,
    ports: SagaPorts,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("mode", &self.mode).finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn wire(mode: PersistenceMode, repos: StageRepositories, generators: Generators) -> Self {
        let intake = Arc::new(IntakeAdapter::new(repos.briefs, generators.normalizer));
        let strategy = Arc::new(StrategyAdapter::new(repos.strategies, generators.strategy, intake.clone()));
        let production = Arc::new(ProductionAdapter::new(repos.drafts, generators.draft, strategy.clone()));
        let quality = Arc::new(QualityAdapter::new(repos.results, generators.evaluator, production.clone()));
        let delivery = Arc::new(DeliveryAdapter::new(repos.packages, generators.delivery, production.clone()).with_quality_gate(quality.clone()));

        let ports = SagaPorts { intake,
                                strategy,
                                production,
                                quality,
                                delivery };
        Self { mode,
               coordinator: SagaCoordinator::new(repos.runs, ports.clone()),
               ports }
    }

    pub fn mode(&self) -> PersistenceMode {
        self.mode
    }

    /// Lookups de sólo lectura (y compensación) de cada etapa.
    pub fn ports(&self) -> &SagaPorts {
        &self.ports
    }

    pub fn execute(&self, run_id: &str, payload: &Value) -> Result<WorkflowRun, SagaError> {
        self.coordinator.execute(run_id, payload)
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, SagaError> {
        self.coordinator.get_run(run_id)
    }

    /// Ejecuta runs independientes en paralelo. El resultado i corresponde a
    /// `requests[i]`.
    pub fn execute_many(&self, requests: &[(String, Value)]) -> Vec<Result<WorkflowRun, SagaError>> {
        requests.par_iter()
                .map(|(run_id, payload)| self.execute(run_id, payload))
                .collect()
    }

    /// Artifacts entregables de un run COMPLETED.
    pub fn delivery_artifacts(&self, run_id: &str) -> Result<Vec<DeliveryArtifact>, PipelineError> {
        let run = self.get_run(run_id)?
                      .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;
        if run.status != RunStatus::Completed {
            return Err(PipelineError::NotCompleted { run_id: run.run_id,
                                                     status: run.status.to_string() });
        }
        let package_id = run.entity_for(Stage::Delivery)
                            .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;
        let package = self.ports
                          .delivery
                          .find_package(package_id)?
                          .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;
        Ok(package.artifacts)
    }

    /// Volcado canónico de un run y de las entidades de su contexto, sin
    /// timestamps. Dos backends con el mismo historial producen el mismo texto.
    pub fn snapshot_run(&self, run_id: &str) -> Result<String, PipelineError> {
        let run = self.get_run(run_id)?
                      .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;
        let mut entities = serde_json::Map::new();
        for record in &run.context {
            let id = record.entity_id.as_str();
            let value = match record.stage {
                Stage::Intake => serde_json::to_value(self.ports.intake.find_brief(id)?)?,
                Stage::Strategy => serde_json::to_value(self.ports.strategy.find_strategy(id)?)?,
                Stage::Production => serde_json::to_value(self.ports.production.find_bundle(id)?)?,
                Stage::Quality => serde_json::to_value(self.ports.quality.find_result(id)?)?,
                Stage::Delivery => serde_json::to_value(self.ports.delivery.find_package(id)?)?,
            };
            entities.insert(record.stage.to_string(), value);
        }
        let dump = json!({
            "run_id": run.run_id,
            "status": run.status,
            "stage_cursor": run.stage_cursor,
            "context": run.context,
            "failure_detail": run.failure_detail,
            "entities": entities,
        });
        Ok(canonical_dump(&dump)?)
    }
}
