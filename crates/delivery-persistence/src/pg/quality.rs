//! Repositorio relacional de la etapa Quality (`qc_results` + `qc_issues`).
//!
//! `draft_id` es UNIQUE: guardar un resultado nuevo para el mismo draft
//! reemplaza al anterior aunque su `result_id` sea distinto.

use delivery_core::{RepositoryError, StageRepository};
use delivery_domain::{QcResult, StageEntity};
use diesel::prelude::*;
use log::debug;

use super::{position, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{qc_issues, qc_results};

#[derive(Insertable, Debug)]
#[diesel(table_name = qc_results)]
struct NewQcRow<'a> {
    result_id: &'a str,
    draft_id: &'a str,
    passed: bool,
    score: f64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = qc_issues)]
struct NewIssueRow<'a> {
    result_id: &'a str,
    position: i32,
    issue: &'a str,
}

pub struct PgQcRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgQcRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> StageRepository<QcResult> for PgQcRepository<P> {
    fn save(&self, result: &QcResult) -> Result<String, RepositoryError> {
        result.validate()
              .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let mut issues = Vec::with_capacity(result.issues.len());
        for (i, issue) in result.issues.iter().enumerate() {
            issues.push(NewIssueRow { result_id: &result.result_id,
                                      position: position(i)?,
                                      issue });
        }
        let replaced = with_retry(|| {
                           let mut conn = self.provider.connection()?;
                           conn.build_transaction().read_write().run(|tx| {
                                                                    let replaced =
                                                                        diesel::delete(qc_results::table.filter(qc_results::result_id.eq(&result.result_id)
                                                                                                                                   .or(qc_results::draft_id.eq(&result.draft_id))))
                                                                            .execute(tx)?;
                                                                    diesel::insert_into(qc_results::table).values(NewQcRow { result_id: &result.result_id,
                                                                                                                             draft_id: &result.draft_id,
                                                                                                                             passed: result.passed,
                                                                                                                             score: result.score })
                                                                                                          .execute(tx)?;
                                                                    if !issues.is_empty() {
                                                                        diesel::insert_into(qc_issues::table).values(&issues).execute(tx)?;
                                                                    }
                                                                    Ok::<_, PersistenceError>(replaced)
                                                                })
                       })?;
        debug!("save:qc_result {} draft={} passed={} replaced={}", result.result_id, result.draft_id, result.passed, replaced);
        Ok(result.result_id.clone())
    }

    fn get(&self, id: &str) -> Result<QcResult, RepositoryError> {
        let found = with_retry(|| {
                        let mut conn = self.provider.connection()?;
                        conn.build_transaction().read_only().repeatable_read().run(|tx| {
                            let parent = qc_results::table.find(id)
                                                          .select((qc_results::draft_id, qc_results::passed, qc_results::score))
                                                          .first::<(String, bool, f64)>(tx)
                                                          .optional()?;
                            let Some(parent) = parent else {
                                return Ok::<_, PersistenceError>(None);
                            };
                            let issues = qc_issues::table.filter(qc_issues::result_id.eq(id))
                                                         .order(qc_issues::position.asc())
                                                         .select(qc_issues::issue)
                                                         .load::<String>(tx)?;
                            Ok(Some((parent, issues)))
                        })
                    })?;
        let ((draft_id, passed, score), issues) = found.ok_or_else(|| RepositoryError::not_found(QcResult::KIND, id))?;
        Ok(QcResult { result_id: id.to_string(),
                      draft_id,
                      passed,
                      score,
                      issues })
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = with_retry(|| {
                          let mut conn = self.provider.connection()?;
                          Ok(diesel::delete(qc_results::table.find(id)).execute(&mut conn)?)
                      })?;
        debug!("delete:qc_result {} removed={}", id, removed);
        Ok(())
    }
}
