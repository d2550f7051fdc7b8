//! Extracting findings from free-form expert answers
//!
//! Experts are asked to report findings one per line as
//!
//! ```text
//! - [HIGH] security @ src/auth.rs:42 (confidence 0.8): token compared with ==
//! ```
//!
//! Models do not always comply, so common review markers (`CRITICAL:`,
//! `[!!]`, `**High**`, `NIT:` ...) are recognised as a fallback.

use crate::expert::role::ExpertKind;
use crate::findings::entities::{Finding, Severity};
use crate::tool::entities::ToolCall;

/// Parse every finding in `answer`, attributing them to `expert`.
///
/// Findings without a category get the expert's default category.
pub fn parse_findings(answer: &str, expert: ExpertKind) -> Vec<Finding> {
    let mut in_code_block = false;
    answer
        .lines()
        .filter(|line| {
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
                return false;
            }
            !in_code_block
        })
        .filter_map(|line| {
            let body = strip_bullet(line.trim());
            parse_structured(body, expert).or_else(|| parse_marked(body, expert))
        })
        .collect()
}

/// Build a finding from `store_finding` tool arguments
pub fn finding_from_tool_call(call: &ToolCall, expert: ExpertKind) -> Result<Finding, String> {
    let description = call.require_string("description")?;
    let severity: Severity = call
        .require_string("severity")?
        .parse()
        .map_err(|e: crate::core::error::DomainError| e.to_string())?;
    let category = call.get_string("category").unwrap_or(expert.default_category());

    let mut finding = Finding::new(expert, severity, category, description);
    if let Some(location) = call.get_string("location") {
        finding = finding.with_location(location);
    }
    if let Some(confidence) = call.get_f64("confidence") {
        finding = finding.with_confidence(confidence as f32);
    }
    Ok(finding)
}

/// `- [SEVERITY] category @ path:line (confidence 0.8): description`
fn parse_structured(body: &str, expert: ExpertKind) -> Option<Finding> {
    let rest = body.strip_prefix('[')?;
    let (severity, rest) = rest.split_once(']')?;
    let severity: Severity = severity.parse().ok()?;
    let rest = rest.trim_start();

    let (head, description) = match rest.split_once(": ") {
        Some((head, description)) if looks_like_head(head) => (head, description),
        _ => ("", rest),
    };
    let description = description.trim();
    if description.is_empty() {
        return None;
    }

    let (head, confidence) = take_confidence(head);
    let (category, location) = match head.split_once('@') {
        Some((category, location)) => (category.trim(), Some(location.trim())),
        None => (head.trim(), None),
    };

    let mut finding = Finding::new(expert, severity, category, description);
    match location {
        Some(location) => finding = finding.with_location(location),
        None => {
            if let Some(location) = find_location(description) {
                finding = finding.with_location(location);
            }
        }
    }
    if let Some(confidence) = confidence {
        finding = finding.with_confidence(confidence);
    }
    Some(finding)
}

/// Lines led by a severity marker
fn parse_marked(body: &str, expert: ExpertKind) -> Option<Finding> {
    const MARKERS: &[(&str, Severity)] = &[
        ("[!!]", Severity::Critical),
        ("[!]", Severity::High),
        ("[-]", Severity::Low),
        ("[nit]", Severity::Low),
        ("critical:", Severity::Critical),
        ("high:", Severity::High),
        ("major:", Severity::High),
        ("medium:", Severity::Medium),
        ("minor:", Severity::Low),
        ("low:", Severity::Low),
        ("nit:", Severity::Low),
    ];

    let lowered = body.to_lowercase();
    let (severity, rest) = MARKERS
        .iter()
        .find(|(marker, _)| lowered.starts_with(marker))
        .map(|(marker, severity)| (*severity, body.get(marker.len()..).unwrap_or_default()))
        .or_else(|| parse_bold_marker(body))?;

    let description = rest.trim_start_matches([':', '-', ' ']).trim();
    if description.is_empty() {
        return None;
    }

    let mut finding = Finding::new(expert, severity, expert.default_category(), description);
    if let Some(location) = find_location(description) {
        finding = finding.with_location(location);
    }
    Some(finding)
}

/// `**High**: ...` or `**Critical** ...`
fn parse_bold_marker(body: &str) -> Option<(Severity, &str)> {
    let rest = body.strip_prefix("**")?;
    let (word, rest) = rest.split_once("**")?;
    let severity = word.trim_end_matches(':').parse().ok()?;
    Some((severity, rest))
}

fn strip_bullet(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim_start();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

/// A head is `category`, `category @ location` and/or `(confidence x)`;
/// anything with free-form words is part of the description.
fn looks_like_head(head: &str) -> bool {
    let (head, confidence) = take_confidence(head);
    if head.contains('@') {
        return true;
    }
    let head = head.trim();
    (confidence.is_some() || !head.contains(' ')) && head.len() <= 40
}

fn take_confidence(head: &str) -> (&str, Option<f32>) {
    let Some(start) = head.find("(confidence") else {
        return (head, None);
    };
    let value = head[start + "(confidence".len()..]
        .trim_start_matches([':', ' '])
        .split(')')
        .next()
        .and_then(|v| v.trim().parse::<f32>().ok());
    (&head[..start], value)
}

fn is_wrapping(c: char) -> bool {
    matches!(c, '`' | '(' | ')' | '[' | ']' | ',' | ';' | '"' | '\'')
}

/// First `path:line` looking token in `text`
fn find_location(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|word| word.trim_matches(is_wrapping).trim_end_matches('.'))
        .find(|word| looks_like_location(word))
        .map(str::to_string)
}

fn looks_like_location(word: &str) -> bool {
    let Some((path, line)) = word.split_once(':') else {
        return false;
    };
    (path.contains('/') || path.contains('.'))
        && !path.contains("//")
        && line.starts_with(|c: char| c.is_ascii_digit())
        && line.chars().all(|c| c.is_ascii_digit() || c == '-' || c == ':')
}
