use delivery_core::{RunStatus, RunStore, StageRepository, WorkflowRun};
use delivery_domain::{Asset, Brief, DeliveryArtifact, DeliveryPackage, DraftBundle, QcResult, StageEntity, Strategy, TacticAssignment};
use delivery_persistence::migrations::{applied_versions, downgrade, schema_snapshot, upgrade_to_head};
use delivery_persistence::pg::{PgBriefRepository, PgDraftRepository, PgPackageRepository, PgPool, PgQcRepository, PgRunStore,
                               PgStrategyRepository};

use test_support::{provider, unique, with_pool};

#[test]
fn downgrade_then_upgrade_restores_identical_schema() {
    with_pool(|pool| {
        let mut conn = pool.get().unwrap();
        let before = schema_snapshot(&mut conn).unwrap();
        let versions = applied_versions(&mut conn).unwrap();
        assert!(before.contains("delivery_artifacts.position"));

        let reverted = downgrade(&mut conn, 1).unwrap();
        assert_eq!(reverted.len(), 1);
        assert_eq!(applied_versions(&mut conn).unwrap().len(), versions.len() - 1);
        assert!(!schema_snapshot(&mut conn).unwrap().contains("delivery_artifacts"));

        let reapplied = upgrade_to_head(&mut conn).unwrap();
        assert_eq!(reapplied, reverted);
        assert_eq!(applied_versions(&mut conn).unwrap(), versions);
        assert_eq!(schema_snapshot(&mut conn).unwrap(), before);
        drop(conn);

        // todas las etapas y el run store siguen funcionando tras el ciclo
        exercise_every_repository(pool);
    });
}

/// save, re-save (reemplazo), get y delete sobre `first` y `second`, que
/// comparten id.
fn round_trip<E, R>(repo: &R, first: E, second: E)
    where E: StageEntity + PartialEq + std::fmt::Debug,
          R: StageRepository<E>
{
    let id = repo.save(&first).unwrap();
    assert_eq!(repo.get(&id).unwrap(), first);
    assert_eq!(repo.save(&second).unwrap(), id);
    assert_eq!(repo.get(&id).unwrap(), second);
    repo.delete(&id).unwrap();
    repo.delete(&id).unwrap();
    assert!(repo.find(&id).unwrap().is_none());
}

fn exercise_every_repository(pool: &PgPool) {
    let brief_id = unique("brief");
    round_trip(&PgBriefRepository::new(provider(pool)),
               Brief::new(brief_id.clone(), unique("run"), r#"{"client":"Acme"}"#).unwrap(),
               Brief::new(brief_id, unique("run"), r#"{"client":"Globex"}"#).unwrap());

    let strategy_id = unique("strategy");
    let tactic = |channel: &str| TacticAssignment { channel: channel.into(),
                                                    tactic: format!("{channel} push") };
    round_trip(&PgStrategyRepository::new(provider(pool)),
               Strategy { strategy_id: strategy_id.clone(),
                          brief_id: unique("brief"),
                          content: "plan a".into(),
                          tactic_assignments: vec![tactic("email"), tactic("web")] },
               Strategy { strategy_id,
                          brief_id: unique("brief"),
                          content: "plan b".into(),
                          tactic_assignments: vec![tactic("social")] });

    let bundle_id = unique("bundle");
    let asset = |title: &str| Asset { kind: "post".into(),
                                      title: title.into(),
                                      body: format!("{title} body") };
    round_trip(&PgDraftRepository::new(provider(pool)),
               DraftBundle { bundle_id: bundle_id.clone(),
                             strategy_id: unique("strategy"),
                             assets: vec![asset("one"), asset("two")] },
               DraftBundle { bundle_id,
                             strategy_id: unique("strategy"),
                             assets: vec![asset("three")] });

    let result_id = unique("qc");
    let draft_id = unique("bundle");
    round_trip(&PgQcRepository::new(provider(pool)),
               QcResult { result_id: result_id.clone(),
                          draft_id: draft_id.clone(),
                          passed: false,
                          score: 0.25,
                          issues: vec!["tone".into(), "length".into()] },
               QcResult { result_id,
                          draft_id,
                          passed: true,
                          score: 1.0,
                          issues: vec![] });

    let package_id = unique("pkg");
    let artifact = |name: &str| DeliveryArtifact { name: name.into(),
                                                   url: format!("https://cdn.example.test/{name}"),
                                                   format: "pdf".into() };
    round_trip(&PgPackageRepository::new(provider(pool)),
               DeliveryPackage { package_id: package_id.clone(),
                                 draft_id: unique("bundle"),
                                 artifacts: vec![artifact("deck"), artifact("brief")] },
               DeliveryPackage { package_id,
                                 draft_id: unique("bundle"),
                                 artifacts: vec![artifact("deck-v2")] });

    let runs = PgRunStore::new(provider(pool));
    let mut run = WorkflowRun::new(unique("run"));
    assert!(runs.create_if_absent(&run).unwrap().is_none());
    run.record(delivery_domain::Stage::Intake, "brief-x");
    run.transition(RunStatus::Compensating).unwrap();
    runs.save(&run).unwrap();
    assert_eq!(runs.find(&run.run_id).unwrap(), Some(run));
}
