//! Repositorio relacional de la etapa Intake (`briefs`).

use delivery_core::{RepositoryError, StageRepository};
use delivery_domain::{Brief, StageEntity};
use diesel::prelude::*;
use log::debug;

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::briefs;

#[derive(Insertable, Debug)]
#[diesel(table_name = briefs)]
struct NewBriefRow<'a> {
    brief_id: &'a str,
    run_id: &'a str,
    normalized_content: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = briefs)]
struct BriefRow {
    brief_id: String,
    run_id: String,
    normalized_content: String,
}

impl From<BriefRow> for Brief {
    fn from(r: BriefRow) -> Self {
        Brief { brief_id: r.brief_id,
                run_id: r.run_id,
                normalized_content: r.normalized_content }
    }
}

pub struct PgBriefRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgBriefRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> StageRepository<Brief> for PgBriefRepository<P> {
    fn save(&self, brief: &Brief) -> Result<String, RepositoryError> {
        brief.validate()
             .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| {
                                                     diesel::delete(briefs::table.find(brief.brief_id.as_str())).execute(tx)?;
                                                     diesel::insert_into(briefs::table).values(NewBriefRow { brief_id: &brief.brief_id,
                                                                                                             run_id: &brief.run_id,
                                                                                                             normalized_content:
                                                                                                                 &brief.normalized_content })
                                                                                       .execute(tx)?;
                                                     Ok::<_, PersistenceError>(())
                                                 })
        })?;
        debug!("save:brief {} (run {})", brief.brief_id, brief.run_id);
        Ok(brief.brief_id.clone())
    }

    fn get(&self, id: &str) -> Result<Brief, RepositoryError> {
        let row = with_retry(|| {
                      let mut conn = self.provider.connection()?;
                      Ok(briefs::table.find(id)
                                      .select(BriefRow::as_select())
                                      .first(&mut conn)
                                      .optional()?)
                  })?;
        row.map(Brief::from)
           .ok_or_else(|| RepositoryError::not_found(Brief::KIND, id))
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = with_retry(|| {
                          let mut conn = self.provider.connection()?;
                          Ok(diesel::delete(briefs::table.find(id)).execute(&mut conn)?)
                      })?;
        debug!("delete:brief {} removed={}", id, removed);
        Ok(())
    }
}
