//! Cross-examination verdicts

use crate::core::error::DomainError;
use crate::expert::role::ExpertKind;
use crate::findings::entities::{Finding, FindingId, FindingOrigin, Severity};
use crate::findings::parsing::parse_findings;
use crate::util::extract_json;
use serde::{Deserialize, Serialize};

/// A reviewer's objection to one finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disagreement {
    pub finding_id: FindingId,
    pub reason: String,
    /// Severity the reviewer would assign instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// One expert's verdict on the other experts' findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub reviewer: ExpertKind,
    pub agreements: Vec<FindingId>,
    pub disagreements: Vec<Disagreement>,
    /// New findings the others missed
    pub gaps: Vec<Finding>,
}

impl ReviewVerdict {
    pub fn empty(reviewer: ExpertKind) -> Self {
        Self {
            reviewer,
            agreements: Vec::new(),
            disagreements: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.agreements.is_empty() && self.disagreements.is_empty() && self.gaps.is_empty()
    }
}

#[derive(Deserialize)]
struct RawReview {
    #[serde(default)]
    agreements: Vec<serde_json::Value>,
    #[serde(default)]
    disagreements: Vec<RawDisagreement>,
    #[serde(default)]
    gaps: Vec<RawGap>,
}

#[derive(Deserialize)]
struct RawDisagreement {
    #[serde(alias = "finding_id", alias = "id")]
    finding: serde_json::Value,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Deserialize)]
struct RawGap {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    confidence: Option<f32>,
}

fn finding_id(value: &serde_json::Value) -> Option<FindingId> {
    match value {
        serde_json::Value::String(s) => FindingId::parse(s),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .map(FindingId),
        _ => None,
    }
}

/// Parse a reviewer's response.
///
/// The JSON form is preferred; a response without JSON is read as a list of
/// gap findings in the line format experts use for their own answers.
pub fn parse_review(text: &str, reviewer: ExpertKind) -> Result<ReviewVerdict, DomainError> {
    let Some(value) = extract_json(text) else {
        let gaps: Vec<Finding> = parse_findings(text, reviewer)
            .into_iter()
            .map(|f| f.with_origin(FindingOrigin::Review))
            .collect();
        return Ok(ReviewVerdict { gaps, ..ReviewVerdict::empty(reviewer) });
    };

    let raw: RawReview =
        serde_json::from_value(value).map_err(|e| DomainError::MalformedReview(e.to_string()))?;

    let agreements = raw.agreements.iter().filter_map(finding_id).collect();
    let disagreements = raw
        .disagreements
        .into_iter()
        .filter_map(|d| {
            Some(Disagreement {
                finding_id: finding_id(&d.finding)?,
                reason: d.reason.trim().to_string(),
                severity: d.severity.and_then(|s| s.parse().ok()),
                confidence: d.confidence.filter(|c| c.is_finite()).map(|c| c.clamp(0.0, 1.0)),
            })
        })
        .collect();
    let gaps = raw
        .gaps
        .into_iter()
        .filter(|g| !g.description.trim().is_empty())
        .map(|g| {
            let severity = g.severity.parse().unwrap_or(Severity::Medium);
            let mut finding = Finding::new(reviewer, severity, g.category, g.description)
                .with_origin(FindingOrigin::Review);
            if let Some(location) = g.location {
                finding = finding.with_location(location);
            }
            if let Some(confidence) = g.confidence {
                finding = finding.with_confidence(confidence);
            }
            finding
        })
        .collect();

    Ok(ReviewVerdict {
        reviewer,
        agreements,
        disagreements,
        gaps,
    })
}
