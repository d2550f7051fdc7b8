//! Finding entities and value objects

use crate::core::error::DomainError;
use crate::expert::role::ExpertKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Confidence used when an expert does not state one
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// Identifier assigned by the findings store on append (`F1`, `F2`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingId(pub u32);

impl FindingId {
    /// Placeholder for findings that have not been appended yet
    pub const UNASSIGNED: FindingId = FindingId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }

    /// Parse `F3`, `f3` or `3`
    pub fn parse(s: &str) -> Option<FindingId> {
        let s = s.trim();
        let digits = s.strip_prefix(['F', 'f']).unwrap_or(s);
        digits.parse::<u32>().ok().filter(|n| *n > 0).map(FindingId)
    }
}

impl std::fmt::Display for FindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Higher is more severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "crit" | "blocker" => Ok(Severity::Critical),
            "high" | "major" | "error" => Ok(Severity::High),
            "medium" | "moderate" | "warning" => Ok(Severity::Medium),
            "low" | "minor" | "nit" | "info" | "informational" => Ok(Severity::Low),
            other => Err(DomainError::InvalidSeverity(other.to_string())),
        }
    }
}

/// Pipeline phase a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingOrigin {
    /// Produced by an expert's own loop
    Execute,
    /// A gap raised while cross-examining other experts
    Review,
    /// A revision of an existing finding after a disagreement
    Delta,
}

/// A structured observation contributed by one expert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: FindingId,
    pub expert: ExpertKind,
    pub severity: Severity,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub confidence: f32,
    pub origin: FindingOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<FindingId>,
}

impl Finding {
    pub fn new(
        expert: ExpertKind,
        severity: Severity,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let category = normalize_category(&category.into());
        Self {
            id: FindingId::UNASSIGNED,
            expert,
            severity,
            category: if category.is_empty() {
                expert.default_category().to_string()
            } else {
                category
            },
            description: description.into().trim().to_string(),
            location: None,
            confidence: DEFAULT_CONFIDENCE,
            origin: FindingOrigin::Execute,
            supersedes: None,
        }
    }

    pub fn with_id(mut self, id: FindingId) -> Self {
        self.id = id;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        let trimmed = location.trim().trim_matches('`').trim();
        self.location = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Set the confidence, clamped to `0.0..=1.0`
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            DEFAULT_CONFIDENCE
        };
        self
    }

    pub fn with_origin(mut self, origin: FindingOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Mark this finding as a revision of `previous`
    pub fn superseding(mut self, previous: FindingId) -> Self {
        self.supersedes = Some(previous);
        self
    }

    /// Short one-line form used in prompts and fallback narratives
    pub fn summary_line(&self) -> String {
        let location = self
            .location
            .as_deref()
            .map(|l| format!(" @ {}", l))
            .unwrap_or_default();
        format!(
            "{} [{}] {}{} ({}, confidence {:.2}): {}",
            self.id,
            self.severity.as_str().to_uppercase(),
            self.category,
            location,
            self.expert.key(),
            self.confidence,
            self.description
        )
    }
}

fn normalize_category(category: &str) -> String {
    category
        .trim()
        .trim_matches(|c| c == '*' || c == '`')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
