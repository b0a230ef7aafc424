//! delivery-domain: entidades de cada etapa del pipeline de entrega.
//!
//! Cada etapa (Intake, Strategy, Production, Quality, Delivery) es dueña de
//! sus propios registros. Las referencias entre etapas son siempre
//! identificadores opacos (`String`), nunca claves foráneas ni punteros a
//! estructuras de otra etapa.
//!
//! Módulos:
//! - `stage`: enum `Stage` con el orden canónico del pipeline.
//! - `ids`: validación de identificadores lógicos.
//! - `text`: texto que ambos backends pueden guardar.
//! - `entity`: trait `StageEntity` usado por los repositorios genéricos.
//! - `brief`, `strategy`, `draft`, `quality`, `package`: entidades.

pub mod brief;
pub mod draft;
pub mod entity;
pub mod error;
pub mod ids;
pub mod package;
pub mod quality;
pub mod stage;
pub mod strategy;
pub mod text;

pub use brief::Brief;
pub use draft::{Asset, DraftBundle};
pub use entity::StageEntity;
pub use error::DomainError;
pub use ids::{validate_logical_id, MAX_LOGICAL_ID_LEN};
pub use package::{DeliveryArtifact, DeliveryPackage};
pub use quality::QcResult;
pub use stage::Stage;
pub use strategy::{Strategy, TacticAssignment};
pub use text::validate_stored_text;
