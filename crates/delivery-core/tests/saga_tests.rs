use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use assert_matches::assert_matches;
use dashmap::DashMap;
use delivery_core::errors::ErrorClass;
use delivery_core::{InMemoryRunStore, RepositoryError, RunStatus, RunStore, SagaContext, SagaCoordinator, SagaError, SagaStep, StageError,
                    WorkflowRun};
use delivery_domain::Stage;
use serde_json::json;

#[derive(Clone, Copy)]
enum Forward {
    Ok,
    Fail,
    Reject,
}

/// Paso falso: crea `<stage>-<run_id>` en un almacén compartido y lo borra al
/// compensar. `fail_on` limita la falla a los run ids que contienen ese texto.
struct FakeStep {
    stage: Stage,
    forward: Forward,
    fail_on: &'static str,
    compensation_breaks: bool,
    live: Arc<DashMap<String, ()>>,
    journal: Arc<Mutex<Vec<String>>>,
    forwards: AtomicUsize,
}

impl FakeStep {
    fn new(stage: Stage, live: &Arc<DashMap<String, ()>>, journal: &Arc<Mutex<Vec<String>>>) -> Self {
        Self { stage,
               forward: Forward::Ok,
               fail_on: "",
               compensation_breaks: false,
               live: live.clone(),
               journal: journal.clone(),
               forwards: AtomicUsize::new(0) }
    }

    fn failing(mut self, forward: Forward, fail_on: &'static str) -> Self {
        self.forward = forward;
        self.fail_on = fail_on;
        self
    }

    fn broken_compensation(mut self) -> Self {
        self.compensation_breaks = true;
        self
    }
}

/// Handle compartido: el test conserva el paso para inspeccionar contadores.
struct Handle(Arc<FakeStep>);

impl SagaStep for Handle {
    fn stage(&self) -> Stage {
        self.0.stage
    }

    fn forward(&self, ctx: &SagaContext<'_>) -> Result<String, StageError> {
        let this = &self.0;
        this.forwards.fetch_add(1, Ordering::SeqCst);
        if this.stage != Stage::Intake {
            // cada paso ve lo que produjo el anterior
            let prev = Stage::ALL[this.stage.index() - 1];
            ctx.entity_for(prev)?;
        }
        let id = format!("{}-{}", this.stage, ctx.run_id);
        let applies = ctx.run_id.contains(this.fail_on);
        match this.forward {
            Forward::Fail if applies => return Err(StageError::Execution("generator unavailable".into())),
            Forward::Reject if applies => {
                this.live.insert(id.clone(), ());
                return Err(StageError::Rejected { entity_id: id,
                                                  reason: "score 0.10".into() });
            }
            _ => {}
        }
        this.live.insert(id.clone(), ());
        Ok(id)
    }

    fn compensate(&self, entity_id: &str) -> Result<(), StageError> {
        self.0.journal.lock().unwrap().push(format!("undo {entity_id}"));
        if self.0.compensation_breaks {
            return Err(StageError::Execution("storage offline".into()));
        }
        self.0.live.remove(entity_id);
        Ok(())
    }
}

/// Run store que rechaza las escrituras de los estados indicados.
struct RefusingRunStore {
    inner: Arc<InMemoryRunStore>,
    refuse: Vec<RunStatus>,
}

impl RunStore for RefusingRunStore {
    fn create_if_absent(&self, run: &WorkflowRun) -> Result<Option<WorkflowRun>, RepositoryError> {
        self.inner.create_if_absent(run)
    }

    fn save(&self, run: &WorkflowRun) -> Result<(), RepositoryError> {
        if self.refuse.contains(&run.status) {
            return Err(RepositoryError::Storage("db down".into()));
        }
        self.inner.save(run)
    }

    fn find(&self, run_id: &str) -> Result<Option<WorkflowRun>, RepositoryError> {
        self.inner.find(run_id)
    }
}

fn refusing(refuse: Vec<RunStatus>) -> Harness {
    let runs = Arc::new(InMemoryRunStore::new());
    let store = Arc::new(RefusingRunStore { inner: runs.clone(),
                                            refuse });
    harness_with(runs, store, |s| s)
}

struct Harness {
    coordinator: SagaCoordinator,
    runs: Arc<InMemoryRunStore>,
    live: Arc<DashMap<String, ()>>,
    journal: Arc<Mutex<Vec<String>>>,
    steps: Vec<Arc<FakeStep>>,
}

fn harness(configure: impl Fn(FakeStep) -> FakeStep) -> Harness {
    let runs = Arc::new(InMemoryRunStore::new());
    harness_with(runs.clone(), runs, configure)
}

/// `runs` es el almacén observado por el test; `store` es el que usa el
/// coordinador (puede envolver a `runs`).
fn harness_with(runs: Arc<InMemoryRunStore>, store: Arc<dyn RunStore>, configure: impl Fn(FakeStep) -> FakeStep) -> Harness {
    let live = Arc::new(DashMap::new());
    let journal = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<FakeStep>> = Stage::ALL.iter()
                                              .map(|s| Arc::new(configure(FakeStep::new(*s, &live, &journal))))
                                              .collect();
    let boxed: Vec<Box<dyn SagaStep>> = steps.iter().map(|s| Box::new(Handle(s.clone())) as Box<dyn SagaStep>).collect();
    let coordinator = SagaCoordinator::with_steps(store, boxed);
    Harness { coordinator,
              runs,
              live,
              journal,
              steps }
}

#[test]
fn all_stages_succeed_and_run_completes() {
    let h = harness(|s| s);
    let run = h.coordinator.execute("run-001", &json!({"client": "Acme"})).unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.stage_cursor, Stage::ALL.len());
    let stages: Vec<Stage> = run.context.iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(run.failure_detail.is_none());
    assert_eq!(h.live.len(), 5);
    assert_eq!(h.runs.find("run-001").unwrap().unwrap(), run);
}

#[test]
fn execution_failure_compensates_in_reverse_order() {
    let h = harness(|s| {
        if s.stage == Stage::Production {
            s.failing(Forward::Fail, "")
        } else {
            s
        }
    });
    let run = h.coordinator.execute("run-002", &json!({})).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.stage_cursor, Stage::Production.index());
    let detail = run.failure_detail.as_ref().unwrap();
    assert_eq!(detail.stage, Stage::Production);
    assert_eq!(detail.class, ErrorClass::StageExecution);
    assert!(detail.compensation_failures.is_empty());

    let journal = h.journal.lock().unwrap().clone();
    assert_eq!(journal, vec!["undo strategy-run-002".to_string(), "undo intake-run-002".to_string()]);
    assert!(h.live.is_empty());
    // Quality y Delivery nunca corrieron
    assert_eq!(h.steps[3].forwards.load(Ordering::SeqCst), 0);
    assert_eq!(h.steps[4].forwards.load(Ordering::SeqCst), 0);
}

#[test]
fn rejected_quality_result_is_compensated_too() {
    let h = harness(|s| {
        if s.stage == Stage::Quality {
            s.failing(Forward::Reject, "")
        } else {
            s
        }
    });
    let run = h.coordinator.execute("run-003", &json!({})).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failure_detail.as_ref().unwrap().class, ErrorClass::QualityRejected);
    assert_eq!(run.entity_for(Stage::Quality), Some("quality-run-003"));
    assert_eq!(h.journal.lock().unwrap().first().map(String::as_str), Some("undo quality-run-003"));
    assert!(h.live.is_empty(), "brief, strategy, draft and qc result must all be gone");
}

#[test]
fn compensation_failure_leaves_run_inconsistent() {
    let h = harness(|s| match s.stage {
        Stage::Strategy => s.broken_compensation(),
        Stage::Quality => s.failing(Forward::Fail, ""),
        _ => s,
    });
    let err = h.coordinator.execute("run-004", &json!({})).unwrap_err();

    assert_matches!(&err, SagaError::RunLeftInconsistent { .. });
    let run = err.run().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.compensation_failures().len(), 1);
    assert_eq!(run.compensation_failures()[0].stage, Stage::Strategy);

    // las demás compensaciones se intentaron igual
    assert_eq!(h.journal.lock().unwrap().len(), 3);
    assert!(h.live.contains_key("strategy-run-004"));
    assert!(!h.live.contains_key("intake-run-004"));

    let stored = h.runs.find("run-004").unwrap().unwrap();
    assert!(stored.is_inconsistent());

    // re-ejecutar devuelve el mismo veredicto sin compensar de nuevo
    assert_matches!(h.coordinator.execute("run-004", &json!({})), Err(SagaError::RunLeftInconsistent { .. }));
    assert_eq!(h.journal.lock().unwrap().len(), 3);
}

#[test]
fn re_execution_is_a_no_op() {
    let h = harness(|s| s);
    let first = h.coordinator.execute("run-005", &json!({"client": "Acme"})).unwrap();
    let second = h.coordinator.execute("run-005", &json!({"client": "Other"})).unwrap();

    assert_eq!(first, second);
    for step in &h.steps {
        assert_eq!(step.forwards.load(Ordering::SeqCst), 1);
    }
    assert_eq!(h.runs.len(), 1);
}

#[test]
fn invalid_run_id_is_rejected_before_anything_runs() {
    let h = harness(|s| s);
    assert_matches!(h.coordinator.execute("", &json!({})), Err(SagaError::InvalidRunId(_)));
    assert_matches!(h.coordinator.execute("run 6", &json!({})), Err(SagaError::InvalidRunId(_)));
    assert!(h.runs.is_empty());
    assert_eq!(h.steps[0].forwards.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_runs_are_isolated() {
    let h = Arc::new(harness(|s| {
        if s.stage == Stage::Quality {
            s.failing(Forward::Reject, "bad")
        } else {
            s
        }
    }));

    let handles: Vec<_> = (0..16).map(|i| {
                                     let h = h.clone();
                                     thread::spawn(move || {
                                         let run_id = if i % 4 == 0 { format!("bad-{i}") } else { format!("good-{i}") };
                                         h.coordinator.execute(&run_id, &json!({})).unwrap()
                                     })
                                 })
                                 .collect();
    let runs: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    for run in &runs {
        if run.run_id.starts_with("bad") {
            assert_eq!(run.status, RunStatus::Failed);
        } else {
            assert_eq!(run.status, RunStatus::Completed);
            for record in &run.context {
                assert!(h.live.contains_key(&record.entity_id), "{} was removed by another run", record.entity_id);
            }
        }
    }
    assert_eq!(h.live.len(), 12 * 5);
}

#[test]
fn concurrent_calls_with_same_run_id_execute_once() {
    let h = Arc::new(harness(|s| s));
    let handles: Vec<_> = (0..8).map(|_| {
                                    let h = h.clone();
                                    thread::spawn(move || h.coordinator.execute("run-shared", &json!({})).unwrap())
                                })
                                .collect();
    for t in handles {
        let run = t.join().unwrap();
        assert_eq!(run.run_id, "run-shared");
    }
    assert_eq!(h.steps[0].forwards.load(Ordering::SeqCst), 1);
    assert_eq!(h.coordinator.get_run("run-shared").unwrap().unwrap().status, RunStatus::Completed);
}

#[test]
fn failed_completion_write_unwinds_the_run() {
    let h = refusing(vec![RunStatus::Completed]);
    let run = h.coordinator.execute("run-007", &json!({})).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    let detail = run.failure_detail.as_ref().unwrap();
    assert_eq!(detail.stage, Stage::Delivery);
    assert_eq!(detail.class, ErrorClass::Persistence);
    assert!(detail.message.contains("db down"));
    assert!(!run.is_inconsistent());
    assert!(h.live.is_empty());
    assert_eq!(h.journal.lock().unwrap().len(), 5);

    let stored = h.runs.find("run-007").unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::Failed);
    assert_eq!(h.coordinator.execute("run-007", &json!({})).unwrap(), stored);
}

#[test]
fn unpersisted_failure_is_reported_as_inconsistent() {
    let h = refusing(vec![RunStatus::Completed, RunStatus::Failed]);
    let err = h.coordinator.execute("run-008", &json!({})).unwrap_err();

    let run = assert_matches!(err, SagaError::RunLeftInconsistent { run } => run);
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.compensation_failures().is_empty());
    assert_matches!(run.failure_detail.as_ref().and_then(|d| d.run_store_error.as_deref()), Some(m) if m.contains("db down"));
    // las compensaciones corrieron igual
    assert!(h.live.is_empty());
}
