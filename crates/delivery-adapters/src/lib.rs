//! delivery-adapters: adaptadores de etapa y generadores de contenido.
//!
//! Este crate provee:
//! - Contratos de generador por etapa (`generator`) y una implementación
//!   determinista basada en plantillas (`template`) para correr el pipeline
//!   sin servicios externos.
//! - Un adaptador por etapa (`stage`) que implementa el puerto del core: es el
//!   único componente que llama a la vez a su repositorio y a su generador.
//!   Los datos upstream se leen a través del puerto de la etapa dueña.

pub mod generator;
pub mod stage;
pub mod template;

pub use generator::{BriefContent, DeliveryGenerator, DraftGenerator, Evaluation, GeneratorError, IntakeNormalizer, QualityEvaluator,
                    StrategyDraft, StrategyGenerator};
pub use stage::{DeliveryAdapter, IntakeAdapter, ProductionAdapter, QualityAdapter, StrategyAdapter};
pub use template::{CanonicalIntakeNormalizer, RubricQualityEvaluator, TemplateDeliveryGenerator, TemplateDraftGenerator,
                   TemplateStrategyGenerator};
