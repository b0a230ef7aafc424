//! Etapas del pipeline en su orden canónico.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Strategy,
    Production,
    Quality,
    Delivery,
}

impl Stage {
    /// Orden de ejecución. La compensación recorre este orden al revés.
    pub const ALL: [Stage; 5] = [Stage::Intake, Stage::Strategy, Stage::Production, Stage::Quality, Stage::Delivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Strategy => "strategy",
            Stage::Production => "production",
            Stage::Quality => "quality",
            Stage::Delivery => "delivery",
        }
    }

    /// Posición (0-based) dentro de `Stage::ALL`.
    pub fn index(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).unwrap_or(Stage::ALL.len())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL.iter()
                  .copied()
                  .find(|st| st.as_str() == s)
                  .ok_or_else(|| DomainError::UnknownStage(s.to_string()))
    }
}
