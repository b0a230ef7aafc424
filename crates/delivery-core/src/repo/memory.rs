//! Backend transitorio: un mapa concurrente por etapa.
//!
//! Sólo se accede a través de `StageRepository`. Las listas de cada entidad
//! se guardan tal cual (`Vec`), por lo que el orden de inserción se conserva.

use dashmap::DashMap;
use delivery_domain::{Brief, DeliveryPackage, DraftBundle, QcResult, StageEntity, Strategy};
use log::debug;

use super::StageRepository;
use crate::errors::RepositoryError;

pub struct InMemoryRepository<E: StageEntity> {
    entries: DashMap<String, E>,
    /// replacement_key -> entity_id vigente.
    by_replacement_key: DashMap<String, String>,
}

pub type InMemoryBriefRepository = InMemoryRepository<Brief>;
pub type InMemoryStrategyRepository = InMemoryRepository<Strategy>;
pub type InMemoryDraftRepository = InMemoryRepository<DraftBundle>;
pub type InMemoryQcRepository = InMemoryRepository<QcResult>;
pub type InMemoryPackageRepository = InMemoryRepository<DeliveryPackage>;

impl<E: StageEntity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self { entries: DashMap::new(),
               by_replacement_key: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: StageEntity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: StageEntity> StageRepository<E> for InMemoryRepository<E> {
    fn save(&self, entity: &E) -> Result<String, RepositoryError> {
        entity.validate()
              .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let id = entity.entity_id().to_string();

        if let Some(key) = entity.replacement_key() {
            if let Some(previous) = self.by_replacement_key.insert(key.to_string(), id.clone()) {
                if previous != id {
                    debug!("save:{} replaces {} for key {}", E::KIND, previous, key);
                    self.entries.remove(&previous);
                }
            }
        }

        if let Some(old) = self.entries.insert(id.clone(), entity.clone()) {
            // Misma clave primaria con otra replacement_key: limpiar el índice viejo.
            if let Some(old_key) = old.replacement_key() {
                if Some(old_key) != entity.replacement_key() {
                    self.by_replacement_key.remove_if(old_key, |_, v| v == &id);
                }
            }
        }
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<E, RepositoryError> {
        self.entries
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| RepositoryError::not_found(E::KIND, id))
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        if let Some((_, old)) = self.entries.remove(id) {
            if let Some(key) = old.replacement_key() {
                self.by_replacement_key.remove_if(key, |_, v| v == id);
            }
        }
        Ok(())
    }
}
