//! Contratos de los generadores de contenido (uno por etapa).
//!
//! Los generadores son puros respecto a su entrada: no persisten nada. El
//! adaptador de la etapa decide ids y escritura.

use delivery_core::StageError;
use delivery_domain::{Asset, Brief, DeliveryArtifact, DraftBundle, Strategy, TacticAssignment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// La entrada no permite generar nada (p.ej. payload sin `client`).
    #[error("invalid generator input: {0}")]
    InvalidInput(String),
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("generation failed: {0}")]
    Failed(String),
}

impl From<GeneratorError> for StageError {
    fn from(e: GeneratorError) -> Self {
        match e {
            GeneratorError::InvalidInput(m) => StageError::Validation(m),
            other => StageError::Execution(other.to_string()),
        }
    }
}

/// Forma normalizada de la solicitud del cliente, tal como queda en
/// `Brief::normalized_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefContent {
    pub client: String,
    pub goal: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BriefContent {
    pub fn parse(brief: &Brief) -> Result<Self, GeneratorError> {
        serde_json::from_str(&brief.normalized_content).map_err(|e| GeneratorError::InvalidInput(format!("brief {}: {e}", brief.brief_id)))
    }
}

/// Salida del generador de estrategia (sin ids).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyDraft {
    pub content: String,
    pub tactic_assignments: Vec<TacticAssignment>,
}

/// Veredicto del evaluador de calidad (sin ids).
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub passed: bool,
    pub score: f64,
    pub issues: Vec<String>,
}

pub trait IntakeNormalizer: Send + Sync {
    /// Devuelve el contenido normalizado del brief.
    fn normalize(&self, run_id: &str, payload: &Value) -> Result<String, GeneratorError>;
}

pub trait StrategyGenerator: Send + Sync {
    fn generate(&self, brief: &Brief) -> Result<StrategyDraft, GeneratorError>;
}

pub trait DraftGenerator: Send + Sync {
    fn generate(&self, strategy: &Strategy) -> Result<Vec<Asset>, GeneratorError>;
}

pub trait QualityEvaluator: Send + Sync {
    fn evaluate(&self, bundle: &DraftBundle) -> Result<Evaluation, GeneratorError>;
}

pub trait DeliveryGenerator: Send + Sync {
    fn package(&self, bundle: &DraftBundle) -> Result<Vec<DeliveryArtifact>, GeneratorError>;
}
