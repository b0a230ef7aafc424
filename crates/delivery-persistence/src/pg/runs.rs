//! Run store relacional del coordinador (`workflow_runs` +
//! `workflow_run_steps`).

use chrono::{DateTime, Utc};
use delivery_core::{FailureDetail, RepositoryError, RunStatus, RunStore, StageRecord, WorkflowRun};
use delivery_domain::Stage;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use serde_json::Value;

use super::{position, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{workflow_run_steps, workflow_runs};

#[derive(Insertable, Debug)]
#[diesel(table_name = workflow_runs)]
struct NewRunRow<'a> {
    run_id: &'a str,
    status: &'a str,
    stage_cursor: i32,
    failure_detail: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = workflow_run_steps)]
struct NewStepRow<'a> {
    run_id: &'a str,
    position: i32,
    stage: &'a str,
    entity_id: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = workflow_runs)]
struct RunRow {
    run_id: String,
    status: String,
    stage_cursor: i32,
    failure_detail: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Corrupt(e.to_string())
}

fn insert_run(tx: &mut PgConnection, run: &WorkflowRun) -> Result<usize, PersistenceError> {
    let failure_detail = run.failure_detail
                            .as_ref()
                            .map(serde_json::to_value)
                            .transpose()
                            .map_err(|e| PersistenceError::Unknown(format!("failure_detail: {e}")))?;
    let stage_cursor = i32::try_from(run.stage_cursor).map_err(corrupt)?;
    let inserted = diesel::insert_into(workflow_runs::table).values(NewRunRow { run_id: &run.run_id,
                                                                                status: run.status.as_str(),
                                                                                stage_cursor,
                                                                                failure_detail,
                                                                                created_at: run.created_at,
                                                                                updated_at: run.updated_at })
                                                            .on_conflict_do_nothing()
                                                            .execute(tx)?;
    if inserted == 0 {
        return Ok(0);
    }
    let mut steps = Vec::with_capacity(run.context.len());
    for (i, r) in run.context.iter().enumerate() {
        steps.push(NewStepRow { run_id: &run.run_id,
                                position: position(i)?,
                                stage: r.stage.as_str(),
                                entity_id: &r.entity_id });
    }
    if !steps.is_empty() {
        diesel::insert_into(workflow_run_steps::table).values(&steps).execute(tx)?;
    }
    Ok(inserted)
}

fn load_run(tx: &mut PgConnection, run_id: &str) -> Result<Option<WorkflowRun>, PersistenceError> {
    let Some(row) = workflow_runs::table.find(run_id)
                                        .select(RunRow::as_select())
                                        .first(tx)
                                        .optional()?
    else {
        return Ok(None);
    };
    let steps = workflow_run_steps::table.filter(workflow_run_steps::run_id.eq(run_id))
                                         .order(workflow_run_steps::position.asc())
                                         .select((workflow_run_steps::stage, workflow_run_steps::entity_id))
                                         .load::<(String, String)>(tx)?;
    let mut context = Vec::with_capacity(steps.len());
    for (stage, entity_id) in steps {
        context.push(StageRecord { stage: stage.parse::<Stage>().map_err(corrupt)?,
                                   entity_id });
    }
    let failure_detail = row.failure_detail
                            .map(serde_json::from_value::<FailureDetail>)
                            .transpose()
                            .map_err(corrupt)?;
    Ok(Some(WorkflowRun { run_id: row.run_id,
                          status: row.status.parse::<RunStatus>().map_err(corrupt)?,
                          stage_cursor: usize::try_from(row.stage_cursor).map_err(corrupt)?,
                          context,
                          failure_detail,
                          created_at: row.created_at,
                          updated_at: row.updated_at }))
}

pub struct PgRunStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgRunStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> RunStore for PgRunStore<P> {
    fn create_if_absent(&self, run: &WorkflowRun) -> Result<Option<WorkflowRun>, RepositoryError> {
        let existing = with_retry(|| {
                           let mut conn = self.provider.connection()?;
                           conn.build_transaction().read_write().run(|tx| {
                                                                    if insert_run(tx, run)? == 1 {
                                                                        return Ok::<_, PersistenceError>(None);
                                                                    }
                                                                    load_run(tx, &run.run_id)
                                                                })
                       })?;
        debug!("create_if_absent:{} existed={}", run.run_id, existing.is_some());
        Ok(existing)
    }

    fn save(&self, run: &WorkflowRun) -> Result<(), RepositoryError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| {
                                                     // reemplazo completo: los pasos caen en cascada
                                                     diesel::delete(workflow_runs::table.find(run.run_id.as_str())).execute(tx)?;
                                                     insert_run(tx, run)?;
                                                     Ok::<_, PersistenceError>(())
                                                 })
        })?;
        debug!("save:run {} status={} cursor={}", run.run_id, run.status, run.stage_cursor);
        Ok(())
    }

    fn find(&self, run_id: &str) -> Result<Option<WorkflowRun>, RepositoryError> {
        Ok(with_retry(|| {
               let mut conn = self.provider.connection()?;
               conn.build_transaction().read_only().repeatable_read().run(|tx| load_run(tx, run_id))
           })?)
    }
}
