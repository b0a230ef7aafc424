//! Estado de un workflow run.
//!
//! El run es la única entidad del coordinador. Guarda el contexto de la saga
//! (qué entidad creó cada etapa, en orden) para poder compensar sólo lo que
//! este run creó.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use delivery_domain::Stage;
use serde::{Deserialize, Serialize};

use crate::errors::{classify_error, CompensationFailure, ErrorClass, SagaError, StageError};

/// Estado del run.
///
/// Las transiciones válidas son:
/// - `InProgress` -> `Completed`
/// - `InProgress` -> `Compensating`
/// - `Compensating` -> `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    InProgress,
    Completed,
    Compensating,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "IN_PROGRESS",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Compensating => "COMPENSATING",
            RunStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!((self, next),
                 (RunStatus::InProgress, RunStatus::Completed)
                 | (RunStatus::InProgress, RunStatus::Compensating)
                 | (RunStatus::Compensating, RunStatus::Failed))
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(RunStatus::InProgress),
            "COMPLETED" => Ok(RunStatus::Completed),
            "COMPENSATING" => Ok(RunStatus::Compensating),
            "FAILED" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// Entrada del contexto de la saga: la etapa y la entidad que creó.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub entity_id: String,
}

/// Detalle de la falla que llevó el run a FAILED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub stage: Stage,
    pub class: ErrorClass,
    pub message: String,
    #[serde(default)]
    pub compensation_failures: Vec<CompensationFailure>,
    /// La escritura final del run falló: lo guardado puede no reflejar este
    /// estado.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_store_error: Option<String>,
}

impl FailureDetail {
    pub fn from_stage_error(stage: Stage, error: &StageError) -> Self {
        Self { stage,
               class: classify_error(error),
               message: error.to_string(),
               compensation_failures: Vec::new(),
               run_store_error: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: String,
    pub status: RunStatus,
    /// Índice en `Stage::ALL` de la etapa en curso; `Stage::ALL.len()` al
    /// completar.
    pub stage_cursor: usize,
    pub context: Vec<StageRecord>,
    pub failure_detail: Option<FailureDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn new(run_id: impl Into<String>) -> Self {
        // Precisión de microsegundos: la misma que conserva Postgres.
        let now = Utc::now().trunc_subsecs(6);
        Self { run_id: run_id.into(),
               status: RunStatus::InProgress,
               stage_cursor: 0,
               context: Vec::new(),
               failure_detail: None,
               created_at: now,
               updated_at: now }
    }

    /// Aplica una transición de estado respetando la monotonicidad.
    pub fn transition(&mut self, next: RunStatus) -> Result<(), SagaError> {
        if !self.status.can_transition_to(next) {
            return Err(SagaError::IllegalTransition { from: self.status.to_string(),
                                                      to: next.to_string() });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    pub fn record(&mut self, stage: Stage, entity_id: impl Into<String>) {
        self.context.push(StageRecord { stage,
                                        entity_id: entity_id.into() });
        self.touch();
    }

    /// Entidad creada por `stage` en este run.
    pub fn entity_for(&self, stage: Stage) -> Option<&str> {
        self.context
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.entity_id.as_str())
    }

    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        self.failure_detail
            .as_ref()
            .map(|d| d.compensation_failures.as_slice())
            .unwrap_or(&[])
    }

    /// FAILED con al menos una compensación fallida, o cuyo estado final no
    /// pudo persistirse.
    pub fn is_inconsistent(&self) -> bool {
        match &self.failure_detail {
            Some(d) => !d.compensation_failures.is_empty() || d.run_store_error.is_some(),
            None => false,
        }
    }

    fn touch(&mut self) {
        let now = Utc::now().trunc_subsecs(6);
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
