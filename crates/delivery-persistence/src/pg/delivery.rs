//! Repositorio relacional de la etapa Delivery (`delivery_packages` +
//! `delivery_artifacts`).

use delivery_core::{RepositoryError, StageRepository};
use delivery_domain::{DeliveryArtifact, DeliveryPackage, StageEntity};
use diesel::prelude::*;
use log::debug;

use super::{position, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{delivery_artifacts, delivery_packages};

#[derive(Insertable, Debug)]
#[diesel(table_name = delivery_packages)]
struct NewPackageRow<'a> {
    package_id: &'a str,
    draft_id: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = delivery_artifacts)]
struct NewArtifactRow<'a> {
    package_id: &'a str,
    position: i32,
    name: &'a str,
    url: &'a str,
    format: &'a str,
}

#[derive(Queryable, Debug)]
struct ArtifactRow {
    name: String,
    url: String,
    format: String,
}

pub struct PgPackageRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgPackageRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> StageRepository<DeliveryPackage> for PgPackageRepository<P> {
    fn save(&self, package: &DeliveryPackage) -> Result<String, RepositoryError> {
        package.validate()
               .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let mut artifacts = Vec::with_capacity(package.artifacts.len());
        for (i, a) in package.artifacts.iter().enumerate() {
            artifacts.push(NewArtifactRow { package_id: &package.package_id,
                                            position: position(i)?,
                                            name: &a.name,
                                            url: &a.url,
                                            format: &a.format });
        }
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx| {
                                                     // reemplazo completo: nunca se mezclan artifacts viejos y nuevos
                                                     diesel::delete(delivery_packages::table.find(package.package_id.as_str())).execute(tx)?;
                                                     diesel::insert_into(delivery_packages::table).values(NewPackageRow { package_id: &package.package_id,
                                                                                                                          draft_id: &package.draft_id })
                                                                                                  .execute(tx)?;
                                                     if !artifacts.is_empty() {
                                                         diesel::insert_into(delivery_artifacts::table).values(&artifacts).execute(tx)?;
                                                     }
                                                     Ok::<_, PersistenceError>(())
                                                 })
        })?;
        debug!("save:delivery_package {} ({} artifacts)", package.package_id, artifacts.len());
        Ok(package.package_id.clone())
    }

    fn get(&self, id: &str) -> Result<DeliveryPackage, RepositoryError> {
        let found = with_retry(|| {
                        let mut conn = self.provider.connection()?;
                        conn.build_transaction().read_only().repeatable_read().run(|tx| {
                            let draft_id = delivery_packages::table.find(id)
                                                                   .select(delivery_packages::draft_id)
                                                                   .first::<String>(tx)
                                                                   .optional()?;
                            let Some(draft_id) = draft_id else {
                                return Ok::<_, PersistenceError>(None);
                            };
                            let artifacts = delivery_artifacts::table.filter(delivery_artifacts::package_id.eq(id))
                                                                     .order(delivery_artifacts::position.asc())
                                                                     .select((delivery_artifacts::name,
                                                                              delivery_artifacts::url,
                                                                              delivery_artifacts::format))
                                                                     .load::<ArtifactRow>(tx)?;
                            Ok(Some((draft_id, artifacts)))
                        })
                    })?;
        let (draft_id, artifacts) = found.ok_or_else(|| RepositoryError::not_found(DeliveryPackage::KIND, id))?;
        Ok(DeliveryPackage { package_id: id.to_string(),
                             draft_id,
                             artifacts: artifacts.into_iter()
                                                 .map(|a| DeliveryArtifact { name: a.name,
                                                                             url: a.url,
                                                                             format: a.format })
                                                 .collect() })
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let removed = with_retry(|| {
                          let mut conn = self.provider.connection()?;
                          Ok(diesel::delete(delivery_packages::table.find(id)).execute(&mut conn)?)
                      })?;
        debug!("delete:delivery_package {} removed={}", id, removed);
        Ok(())
    }
}
