//! Reasoning strategy selection

use crate::core::{error::DomainError, model::Model};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Strategy variant requested on the command line or in config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Single,
    Decoupled,
}

impl FromStr for StrategyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(StrategyKind::Single),
            "decoupled" => Ok(StrategyKind::Decoupled),
            other => Err(DomainError::InvalidMode(other.to_string())),
        }
    }
}

/// Which model plays which part in an expert's loop.
///
/// - `Single`: one model decides tool calls and writes the final analysis.
/// - `Decoupled`: a dialogue model drives the tool loop; once the loop ends a
///   separate analysis model is called exactly once over the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReasoningStrategy {
    Single { model: Model },
    Decoupled { dialogue: Model, analysis: Model },
}

impl ReasoningStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            ReasoningStrategy::Single { .. } => StrategyKind::Single,
            ReasoningStrategy::Decoupled { .. } => StrategyKind::Decoupled,
        }
    }

    pub fn is_decoupled(&self) -> bool {
        matches!(self, ReasoningStrategy::Decoupled { .. })
    }

    /// Model that decides the next tool call
    pub fn dialogue_model(&self) -> &Model {
        match self {
            ReasoningStrategy::Single { model } => model,
            ReasoningStrategy::Decoupled { dialogue, .. } => dialogue,
        }
    }

    /// Model that writes the substantive analysis
    pub fn analysis_model(&self) -> &Model {
        match self {
            ReasoningStrategy::Single { model } => model,
            ReasoningStrategy::Decoupled { analysis, .. } => analysis,
        }
    }
}

impl std::fmt::Display for ReasoningStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningStrategy::Single { model } => write!(f, "single({})", model),
            ReasoningStrategy::Decoupled { dialogue, analysis } => {
                write!(f, "decoupled({} -> {})", dialogue, analysis)
            }
        }
    }
}
