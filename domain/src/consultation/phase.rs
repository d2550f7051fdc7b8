//! Pipeline phases

use serde::{Deserialize, Serialize};

/// Phases reported to progress listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouncilPhase {
    Plan,
    Execute,
    Review,
    Delta,
    Synthesize,
    /// Merge step of the parallel fallback
    Merge,
}

impl CouncilPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouncilPhase::Plan => "plan",
            CouncilPhase::Execute => "execute",
            CouncilPhase::Review => "review",
            CouncilPhase::Delta => "delta",
            CouncilPhase::Synthesize => "synthesize",
            CouncilPhase::Merge => "merge",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CouncilPhase::Plan => "Planning",
            CouncilPhase::Execute => "Expert Analysis",
            CouncilPhase::Review => "Cross Review",
            CouncilPhase::Delta => "Delta",
            CouncilPhase::Synthesize => "Synthesis",
            CouncilPhase::Merge => "Merge",
        }
    }
}

impl std::fmt::Display for CouncilPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
