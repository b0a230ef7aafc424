//! Repositorios de etapa: contrato común y backend transitorio.
//!
//! El backend relacional vive en `delivery-persistence`.

mod memory;
mod types;

pub use memory::{InMemoryBriefRepository, InMemoryDraftRepository, InMemoryPackageRepository, InMemoryQcRepository, InMemoryRepository,
                 InMemoryStrategyRepository};
pub use types::StageRepository;
