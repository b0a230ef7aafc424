//! Repositorio relacional de la etapa Strategy (`strategies` +
//! `strategy_tactics`).

use delivery_core::{RepositoryError, StageRepository};
use delivery_domain::{StageEntity, Strategy, TacticAssignment};
use diesel::prelude::*;
use log::debug;

use super::{position, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{strategies, strategy_tactics};

#[derive(Insertable, Debug)]
#[diesel(table_name = strategies)]
struct NewStrategyRow<'a> {
    strategy_id: &'a str,
    brief_id: &'a str,
    content: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = strategy_tactics)]
struct NewTacticRow<'a> {
    strategy_id: &'a str,
    position: i32,
    channel: &'a str,
    tactic: &'a str,
}

pub struct PgStrategyRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgStrategyRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> StageRepository<Strategy> for PgStrategyRepository<P> {
    fn save(&self, strategy: &Strategy) -> Result<String, RepositoryError> {
        strategy.validate()
                .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let mut tactics = Vec::with_capacity(strategy.tactic_assignments.len());
        for (i, t) in strategy.tactic_assignments.iter().enumerate() {
            tactics.push(NewTacticRow { strategy_id: &strategy.strategy_id,
                                        position: position(i)?,
                                        channel: &t.channel,
                                        tactic: &t.tactic });
        }
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| {
                                                     // cascada: borra también las tácticas previas
                                                     diesel::delete(strategies::table.find(strategy.strategy_id.as_str())).execute(tx)?;
                                                     diesel::insert_into(strategies::table).values(NewStrategyRow { strategy_id: &strategy.strategy_id,
                                                                                                                    brief_id: &strategy.brief_id,
                                                                                                                    content: &strategy.content })
                                                                                           .execute(tx)?;
                                                     if !tactics.is_empty() {
                                                         diesel::insert_into(strategy_tactics::table).values(&tactics).execute(tx)?;
                                                     }
                                                     Ok::<_, PersistenceError>(())
                                                 })
        })?;
        debug!("save:strategy {} ({} tactics)", strategy.strategy_id, tactics.len());
        Ok(strategy.strategy_id.clone())
    }

    fn get(&self, id: &str) -> Result<Strategy, RepositoryError> {
        let found = with_retry(|| {
                        let mut conn = self.provider.connection()?;
                        conn.build_transaction().read_only().repeatable_read().run(|tx| {
                            let parent = strategies::table.find(id)
                                                          .select((strategies::brief_id, strategies::content))
                                                          .first::<(String, String)>(tx)
                                                          .optional()?;
                            let Some((brief_id, content)) = parent else {
                                return Ok::<_, PersistenceError>(None);
                            };
                            let tactics = strategy_tactics::table.filter(strategy_tactics::strategy_id.eq(id))
                                                                 .order(strategy_tactics::position.asc())
                                                                 .select((strategy_tactics::channel, strategy_tactics::tactic))
                                                                 .load::<(String, String)>(tx)?;
                            Ok(Some((brief_id, content, tactics)))
                        })
                    })?;
        let (brief_id, content, tactics) = found.ok_or_else(|| RepositoryError::not_found(Strategy::KIND, id))?;
        Ok(Strategy { strategy_id: id.to_string(),
                      brief_id,
                      content,
                      tactic_assignments: tactics.into_iter()
                                                 .map(|(channel, tactic)| TacticAssignment { channel, tactic })
                                                 .collect() })
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = with_retry(|| {
                          let mut conn = self.provider.connection()?;
                          Ok(diesel::delete(strategies::table.find(id)).execute(&mut conn)?)
                      })?;
        debug!("delete:strategy {} removed={}", id, removed);
        Ok(())
    }
}
