//! Finding deduplication

use crate::core::error::DomainError;
use crate::findings::entities::{Finding, FindingId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// How precisely two findings must point at the same place to be duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupGranularity {
    /// Same category and same `path:line`
    #[default]
    Location,
    /// Same category and same file, line ignored
    File,
}

impl FromStr for DedupGranularity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "location" | "line" => Ok(DedupGranularity::Location),
            "file" => Ok(DedupGranularity::File),
            other => Err(DomainError::InvalidMode(other.to_string())),
        }
    }
}

/// Key under which findings collapse
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FindingKey {
    Located { category: String, location: String },
    /// Findings without a location are keyed by their normalized text
    Unlocated { category: String, description: String },
}

impl Finding {
    pub fn dedup_key(&self, granularity: DedupGranularity) -> FindingKey {
        let category = self.category.to_lowercase();
        match &self.location {
            Some(location) => FindingKey::Located {
                category,
                location: normalize_location(location, granularity),
            },
            None => FindingKey::Unlocated {
                category,
                description: normalize_description(&self.description),
            },
        }
    }
}

/// A finding that lost to another finding with the same key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supersession {
    pub finding: Finding,
    pub superseded_by: FindingId,
}

/// Result of collapsing duplicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dedupe {
    /// One finding per key, in order of the key's first appearance
    pub kept: Vec<Finding>,
    pub superseded: Vec<Supersession>,
}

/// Collapse findings with equal keys.
///
/// A revision is grouped under the key of the finding it supersedes, so a
/// dispute lands next to its target even when its own text differs.
/// Within a group, findings explicitly superseded by another member are out
/// of the running; the highest-confidence remaining entry wins, ties going to
/// the later arrival. Pure and idempotent.
pub fn dedupe_findings(findings: &[Finding], granularity: DedupGranularity) -> Dedupe {
    let by_id: HashMap<FindingId, usize> = findings
        .iter()
        .enumerate()
        .filter(|(_, f)| f.id.is_assigned())
        .map(|(i, f)| (f.id, i))
        .collect();

    let mut order: Vec<FindingKey> = Vec::new();
    let mut groups: HashMap<FindingKey, Vec<usize>> = HashMap::new();

    for idx in 0..findings.len() {
        let key = findings[revision_root(findings, &by_id, idx)].dedup_key(granularity);
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(idx);
    }

    let mut result = Dedupe::default();
    for key in order {
        let Some(members) = groups.remove(&key) else {
            continue;
        };

        let revised: HashSet<FindingId> = members
            .iter()
            .filter_map(|&i| findings[i].supersedes)
            .filter(|id| id.is_assigned())
            .collect();
        let eligible: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| !revised.contains(&findings[i].id))
            .collect();
        let pool = if eligible.is_empty() { &members } else { &eligible };

        let Some(winner) = pool.iter().copied().max_by(|&a, &b| {
            findings[a]
                .confidence
                .total_cmp(&findings[b].confidence)
                .then(a.cmp(&b))
        }) else {
            continue;
        };

        let winner_id = findings[winner].id;
        result.kept.push(findings[winner].clone());
        result.superseded.extend(members.iter().filter(|&&i| i != winner).map(|&i| Supersession {
            finding: findings[i].clone(),
            superseded_by: winner_id,
        }));
    }

    result
}

/// Follow `supersedes` links back to the first finding of the chain that is
/// present in the input
fn revision_root(findings: &[Finding], by_id: &HashMap<FindingId, usize>, start: usize) -> usize {
    let mut current = start;
    for _ in 0..findings.len() {
        let next = findings[current]
            .supersedes
            .and_then(|id| by_id.get(&id).copied())
            .filter(|&next| next != current);
        match next {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Normalize a `path:line` reference for keying
pub fn normalize_location(location: &str, granularity: DedupGranularity) -> String {
    let mut loc = location.trim().trim_matches('`').replace('\\', "/");
    while let Some(stripped) = loc.strip_prefix("./") {
        loc = stripped.to_string();
    }
    if granularity == DedupGranularity::File {
        while let Some((head, tail)) = loc.rsplit_once(':') {
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit() || c == '-') {
                loc = head.to_string();
            } else {
                break;
            }
        }
    }
    loc
}

fn normalize_description(description: &str) -> String {
    description
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '!', ';', ':'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expert::role::ExpertKind;
    use crate::findings::entities::{FindingOrigin, Severity};

    fn finding(
        id: u32,
        expert: ExpertKind,
        category: &str,
        location: &str,
        confidence: f32,
    ) -> Finding {
        Finding::new(expert, Severity::High, category, format!("issue {}", id))
            .with_id(FindingId(id))
            .with_location(location)
            .with_confidence(confidence)
    }

    #[test]
    fn test_keeps_highest_confidence_per_location() {
        let findings = vec![
            finding(1, ExpertKind::Security, "security", "src/auth.rs:42", 0.6),
            finding(2, ExpertKind::CodeReviewer, "style", "src/auth.rs:42", 0.9),
            finding(3, ExpertKind::Architect, "security", "./src/auth.rs:42", 0.8),
        ];
        let result = dedupe_findings(&findings, DedupGranularity::Location);

        let kept: Vec<u32> = result.kept.iter().map(|f| f.id.0).collect();
        assert_eq!(kept, vec![3, 2]);
        assert_eq!(result.superseded.len(), 1);
        assert_eq!(result.superseded[0].finding.id, FindingId(1));
        assert_eq!(result.superseded[0].superseded_by, FindingId(3));
    }

    #[test]
    fn test_file_granularity_ignores_lines() {
        let findings = vec![
            finding(1, ExpertKind::Security, "security", "src/auth.rs:10", 0.5),
            finding(2, ExpertKind::Security, "security", "src/auth.rs:88", 0.7),
        ];
        assert_eq!(dedupe_findings(&findings, DedupGranularity::Location).kept.len(), 2);
        let by_file = dedupe_findings(&findings, DedupGranularity::File);
        assert_eq!(by_file.kept.len(), 1);
        assert_eq!(by_file.kept[0].id, FindingId(2));
    }

    #[test]
    fn test_explicit_revision_wins_over_confidence() {
        let original = finding(1, ExpertKind::Security, "security", "src/db.rs:7", 0.9);
        let revision = finding(2, ExpertKind::Architect, "security", "src/db.rs:7", 0.4)
            .with_origin(FindingOrigin::Delta)
            .superseding(FindingId(1));
        let result = dedupe_findings(&[original, revision], DedupGranularity::Location);

        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].id, FindingId(2));
        assert_eq!(result.superseded[0].finding.id, FindingId(1));
    }

    #[test]
    fn test_unlocated_findings_key_on_description() {
        let unlocated = |id, expert, description: &str| {
            Finding::new(expert, Severity::Medium, "architecture", description)
                .with_id(FindingId(id))
        };
        let a = unlocated(1, ExpertKind::Architect, "Too many layers.");
        let b = unlocated(2, ExpertKind::ScopeAnalyst, "too   many layers");
        let c = unlocated(3, ExpertKind::ScopeAnalyst, "missing tests");
        let result = dedupe_findings(&[a, b, c], DedupGranularity::Location);
        assert_eq!(result.kept.len(), 2);
    }

    #[test]
    fn test_revision_of_unlocated_finding_supersedes_it() {
        let original =
            Finding::new(ExpertKind::Security, Severity::High, "security", "tokens written to logs")
                .with_id(FindingId(1))
                .with_confidence(0.9);
        let other = finding(2, ExpertKind::Architect, "architecture", "src/store.rs:3", 0.6);
        let revision = Finding::new(
            ExpertKind::Architect,
            Severity::Low,
            "security",
            "Disputed by Architect: the logger redacts tokens",
        )
        .with_id(FindingId(3))
        .with_confidence(0.5)
        .with_origin(FindingOrigin::Delta)
        .superseding(FindingId(1));

        let result = dedupe_findings(&[original, other, revision], DedupGranularity::Location);

        let kept: Vec<u32> = result.kept.iter().map(|f| f.id.0).collect();
        assert_eq!(kept, vec![3, 2]);
        assert_eq!(result.superseded.len(), 1);
        assert_eq!(result.superseded[0].finding.id, FindingId(1));
        assert_eq!(result.superseded[0].superseded_by, FindingId(3));
    }

    #[test]
    fn test_revision_chain_collapses_to_latest() {
        let original = finding(1, ExpertKind::Security, "security", "src/db.rs:7", 0.9);
        let first = Finding::new(ExpertKind::Architect, Severity::Medium, "security", "disputed")
            .with_id(FindingId(2))
            .superseding(FindingId(1));
        let second = Finding::new(ExpertKind::Performance, Severity::Low, "security", "again")
            .with_id(FindingId(3))
            .superseding(FindingId(2));

        let result = dedupe_findings(&[original, first, second], DedupGranularity::Location);

        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].id, FindingId(3));
        assert_eq!(result.superseded.len(), 2);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let findings = vec![
            finding(1, ExpertKind::Security, "security", "src/a.rs:1", 0.6),
            finding(2, ExpertKind::Security, "security", "src/a.rs:1", 0.6),
            finding(3, ExpertKind::Performance, "performance", "src/b.rs:9", 0.3),
            finding(4, ExpertKind::Architect, "security", "src/a.rs:1", 0.2)
                .superseding(FindingId(2)),
            finding(5, ExpertKind::Performance, "performance", "src/b.rs:9", 0.3),
        ];
        for granularity in [DedupGranularity::Location, DedupGranularity::File] {
            let once = dedupe_findings(&findings, granularity);
            let twice = dedupe_findings(&once.kept, granularity);
            assert_eq!(twice.kept, once.kept);
            assert!(twice.superseded.is_empty());
        }
    }

    #[test]
    fn test_ties_go_to_later_arrival() {
        let findings = vec![
            finding(1, ExpertKind::Security, "security", "src/a.rs:1", 0.6),
            finding(2, ExpertKind::CodeReviewer, "security", "src/a.rs:1", 0.6),
        ];
        let result = dedupe_findings(&findings, DedupGranularity::Location);
        assert_eq!(result.kept[0].id, FindingId(2));
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(
            normalize_location("`./src\\lib.rs:12`", DedupGranularity::Location),
            "src/lib.rs:12"
        );
        assert_eq!(normalize_location("src/lib.rs:12:5", DedupGranularity::File), "src/lib.rs");
        assert_eq!(normalize_location("src/lib.rs:10-20", DedupGranularity::File), "src/lib.rs");
        assert_eq!(normalize_location("Cargo.toml", DedupGranularity::File), "Cargo.toml");
    }
}
