use std::sync::Arc;

use assert_matches::assert_matches;
use delivery_adapters::{DraftGenerator, Evaluation, GeneratorError, QualityEvaluator, RubricQualityEvaluator};
use delivery_core::repo::InMemoryBriefRepository;
use delivery_core::{ErrorClass, RepositoryError, RunStatus, SagaError, StageRepository};
use delivery_domain::{Asset, Brief, DraftBundle, Stage, Strategy};
use deliveryflow::{AppConfig, Generators, Pipeline, PipelineError, PersistenceMode, StageRepositories};
use serde_json::{json, Value};

fn transient(generators: Generators) -> Pipeline {
    Pipeline::wire(PersistenceMode::Transient, StageRepositories::transient(), generators)
}

fn acme() -> Value {
    json!({"client": "Acme", "goal": "launch"})
}

struct AlwaysReject;

impl QualityEvaluator for AlwaysReject {
    fn evaluate(&self, _bundle: &DraftBundle) -> Result<Evaluation, GeneratorError> {
        Ok(Evaluation { passed: false,
                        score: 0.2,
                        issues: vec!["tone does not match the brand".into()] })
    }
}

/// Rechaza los drafts de un cliente concreto; el resto pasa por la rúbrica.
struct RejectClient(&'static str);

impl QualityEvaluator for RejectClient {
    fn evaluate(&self, bundle: &DraftBundle) -> Result<Evaluation, GeneratorError> {
        if bundle.assets.iter().any(|a| a.body.contains(self.0)) {
            return Ok(Evaluation { passed: false,
                                   score: 0.0,
                                   issues: vec![format!("{} is on hold", self.0)] });
        }
        RubricQualityEvaluator::default().evaluate(bundle)
    }
}

struct BrokenDrafts;

impl DraftGenerator for BrokenDrafts {
    fn generate(&self, _strategy: &Strategy) -> Result<Vec<Asset>, GeneratorError> {
        Err(GeneratorError::Unavailable("copywriter offline".into()))
    }
}

/// Repositorio de briefs cuyo `delete` siempre falla.
#[derive(Default)]
struct UndeletableBriefs(InMemoryBriefRepository);

impl StageRepository<Brief> for UndeletableBriefs {
    fn save(&self, entity: &Brief) -> Result<String, RepositoryError> {
        self.0.save(entity)
    }

    fn get(&self, id: &str) -> Result<Brief, RepositoryError> {
        self.0.get(id)
    }

    fn delete(&self, _id: &str) -> Result<(), RepositoryError> {
        Err(RepositoryError::Storage("disk is read-only".into()))
    }
}

#[test]
fn a_run_completes_and_delivers_artifacts() {
    let pipeline = transient(Generators::default());
    let run = pipeline.execute("run-001", &acme()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.stage_cursor, Stage::ALL.len());
    let stages: Vec<Stage> = run.context.iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(run.failure_detail.is_none());

    let strategy_id = run.entity_for(Stage::Strategy).unwrap();
    let strategy = pipeline.ports().strategy.find_strategy(strategy_id).unwrap().unwrap();
    assert!(!strategy.content.is_empty());

    let artifacts = pipeline.delivery_artifacts("run-001").unwrap();
    assert!(!artifacts.is_empty());
    assert!(artifacts.iter().any(|a| a.format == "json"));
}

#[test]
fn re_executing_a_run_returns_the_stored_run() {
    let pipeline = transient(Generators::default());
    let first = pipeline.execute("run-002", &acme()).unwrap();
    let again = pipeline.execute("run-002", &json!({"client": "Other", "goal": "ignored"})).unwrap();
    assert_eq!(first, again);
    assert_eq!(pipeline.get_run("run-002").unwrap(), Some(first));
}

#[test]
fn quality_rejection_compensates_every_stage() {
    let pipeline = transient(Generators { evaluator: Arc::new(AlwaysReject),
                                          ..Generators::default() });
    let run = pipeline.execute("run-003", &acme()).unwrap();
    assert_eq!(run.status, RunStatus::Failed);

    let detail = run.failure_detail.as_ref().unwrap();
    assert_eq!(detail.stage, Stage::Quality);
    assert_eq!(detail.class, ErrorClass::QualityRejected);
    assert!(detail.compensation_failures.is_empty());

    let ports = pipeline.ports();
    assert!(ports.intake.find_brief(run.entity_for(Stage::Intake).unwrap()).unwrap().is_none());
    assert!(ports.strategy.find_strategy(run.entity_for(Stage::Strategy).unwrap()).unwrap().is_none());
    assert!(ports.production.find_bundle(run.entity_for(Stage::Production).unwrap()).unwrap().is_none());
    assert!(ports.quality.find_result(run.entity_for(Stage::Quality).unwrap()).unwrap().is_none());
    assert!(run.entity_for(Stage::Delivery).is_none());

    assert_matches!(pipeline.delivery_artifacts("run-003"), Err(PipelineError::NotCompleted { .. }));
}

#[test]
fn a_generator_failure_undoes_upstream_stages() {
    let pipeline = transient(Generators { draft: Arc::new(BrokenDrafts),
                                          ..Generators::default() });
    let run = pipeline.execute("run-004", &acme()).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    let detail = run.failure_detail.as_ref().unwrap();
    assert_eq!(detail.stage, Stage::Production);
    assert_eq!(detail.class, ErrorClass::StageExecution);
    assert!(detail.message.contains("copywriter offline"));
    assert_eq!(run.context.len(), 2);
    assert!(pipeline.ports().intake.find_brief(run.entity_for(Stage::Intake).unwrap()).unwrap().is_none());
    assert!(pipeline.ports().strategy.find_strategy(run.entity_for(Stage::Strategy).unwrap()).unwrap().is_none());
}

#[test]
fn a_malformed_request_fails_at_intake_without_writes() {
    let pipeline = transient(Generators::default());
    let run = pipeline.execute("run-005", &json!({"client": "Acme"})).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.context.is_empty());
    let detail = run.failure_detail.unwrap();
    assert_eq!(detail.stage, Stage::Intake);
    assert_eq!(detail.class, ErrorClass::Validation);

    assert_matches!(pipeline.execute("not a valid id", &acme()), Err(SagaError::InvalidRunId(_)));
    assert_eq!(pipeline.get_run("not a valid id").unwrap_or(None), None);
}

#[test]
fn a_failed_compensation_leaves_the_run_inconsistent() {
    let repos = StageRepositories { briefs: Arc::new(UndeletableBriefs::default()),
                                    ..StageRepositories::transient() };
    let pipeline = Pipeline::wire(PersistenceMode::Transient,
                                  repos,
                                  Generators { evaluator: Arc::new(AlwaysReject),
                                               ..Generators::default() });

    let err = pipeline.execute("run-006", &acme()).unwrap_err();
    let run = assert_matches!(err, SagaError::RunLeftInconsistent { run } => run);
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.is_inconsistent());
    let failures = run.compensation_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].stage, Stage::Intake);

    // El resto de las compensaciones se ejecutó igual.
    assert!(pipeline.ports().strategy.find_strategy(run.entity_for(Stage::Strategy).unwrap()).unwrap().is_none());
    assert!(pipeline.ports().intake.find_brief(run.entity_for(Stage::Intake).unwrap()).unwrap().is_some());

    assert_matches!(pipeline.execute("run-006", &acme()), Err(SagaError::RunLeftInconsistent { .. }));
}

#[test]
fn concurrent_runs_do_not_affect_each_other() {
    let pipeline = transient(Generators { evaluator: Arc::new(RejectClient("Globex")),
                                          ..Generators::default() });
    let requests: Vec<(String, Value)> = (0..24).map(|i| {
                                                    let client = if i % 3 == 0 { "Globex" } else { "Acme" };
                                                    (format!("run-par-{i:02}"), json!({"client": client, "goal": format!("launch {i}")}))
                                                })
                                                .collect();
    let results = pipeline.execute_many(&requests);
    assert_eq!(results.len(), requests.len());

    for (i, result) in results.into_iter().enumerate() {
        let run = result.unwrap();
        assert_eq!(run.run_id, requests[i].0);
        if i % 3 == 0 {
            assert_eq!(run.status, RunStatus::Failed, "{}", run.run_id);
            assert!(pipeline.ports().intake.find_brief(run.entity_for(Stage::Intake).unwrap()).unwrap().is_none());
        } else {
            assert_eq!(run.status, RunStatus::Completed, "{}", run.run_id);
            assert!(!pipeline.delivery_artifacts(&run.run_id).unwrap().is_empty());
        }
    }
}

#[test]
fn transient_config_builds_a_pipeline() {
    let pipeline = deliveryflow::build_pipeline(&AppConfig::transient()).unwrap();
    assert_eq!(pipeline.mode(), PersistenceMode::Transient);
    assert_matches!(pipeline.delivery_artifacts("run-missing"), Err(PipelineError::RunNotFound(_)));

    let relational_without_db = AppConfig { mode: PersistenceMode::Relational,
                                            database: None };
    assert_matches!(deliveryflow::build_pipeline(&relational_without_db), Err(PipelineError::Config(_)));
}
