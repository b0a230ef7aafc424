//! Repositorio relacional de la etapa Production (`draft_bundles` +
//! `draft_assets`).

use delivery_core::{RepositoryError, StageRepository};
use delivery_domain::{Asset, DraftBundle, StageEntity};
use diesel::prelude::*;
use log::debug;

use super::{position, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{draft_assets, draft_bundles};

#[derive(Insertable, Debug)]
#[diesel(table_name = draft_bundles)]
struct NewBundleRow<'a> {
    bundle_id: &'a str,
    strategy_id: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = draft_assets)]
struct NewAssetRow<'a> {
    bundle_id: &'a str,
    position: i32,
    kind: &'a str,
    title: &'a str,
    body: &'a str,
}

#[derive(Queryable, Debug)]
struct AssetRow {
    kind: String,
    title: String,
    body: String,
}

pub struct PgDraftRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgDraftRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> StageRepository<DraftBundle> for PgDraftRepository<P> {
    fn save(&self, bundle: &DraftBundle) -> Result<String, RepositoryError> {
        bundle.validate()
              .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let mut assets = Vec::with_capacity(bundle.assets.len());
        for (i, a) in bundle.assets.iter().enumerate() {
            assets.push(NewAssetRow { bundle_id: &bundle.bundle_id,
                                      position: position(i)?,
                                      kind: &a.kind,
                                      title: &a.title,
                                      body: &a.body });
        }
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| {
                                                     diesel::delete(draft_bundles::table.find(bundle.bundle_id.as_str())).execute(tx)?;
                                                     diesel::insert_into(draft_bundles::table).values(NewBundleRow { bundle_id: &bundle.bundle_id,
                                                                                                                     strategy_id: &bundle.strategy_id })
                                                                                              .execute(tx)?;
                                                     if !assets.is_empty() {
                                                         diesel::insert_into(draft_assets::table).values(&assets).execute(tx)?;
                                                     }
                                                     Ok::<_, PersistenceError>(())
                                                 })
        })?;
        debug!("save:draft_bundle {} ({} assets)", bundle.bundle_id, assets.len());
        Ok(bundle.bundle_id.clone())
    }

    fn get(&self, id: &str) -> Result<DraftBundle, RepositoryError> {
        let found = with_retry(|| {
                        let mut conn = self.provider.connection()?;
                        conn.build_transaction().read_only().repeatable_read().run(|tx| {
                            let strategy_id = draft_bundles::table.find(id)
                                                                  .select(draft_bundles::strategy_id)
                                                                  .first::<String>(tx)
                                                                  .optional()?;
                            let Some(strategy_id) = strategy_id else {
                                return Ok::<_, PersistenceError>(None);
                            };
                            let assets = draft_assets::table.filter(draft_assets::bundle_id.eq(id))
                                                            .order(draft_assets::position.asc())
                                                            .select((draft_assets::kind, draft_assets::title, draft_assets::body))
                                                            .load::<AssetRow>(tx)?;
                            Ok(Some((strategy_id, assets)))
                        })
                    })?;
        let (strategy_id, assets) = found.ok_or_else(|| RepositoryError::not_found(DraftBundle::KIND, id))?;
        Ok(DraftBundle { bundle_id: id.to_string(),
                         strategy_id,
                         assets: assets.into_iter()
                                       .map(|a| Asset { kind: a.kind,
                                                        title: a.title,
                                                        body: a.body })
                                       .collect() })
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = with_retry(|| {
                          let mut conn = self.provider.connection()?;
                          Ok(diesel::delete(draft_bundles::table.find(id)).execute(&mut conn)?)
                      })?;
        debug!("delete:draft_bundle {} removed={}", id, removed);
        Ok(())
    }
}
