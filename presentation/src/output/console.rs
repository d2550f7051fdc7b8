//! Console output formatter for consultation results

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use council_domain::{
    ConsultationResult, ConsultationStatus, ExecutionPath, ExpertReport, Finding, SessionStatus,
    Severity,
};

/// Formats consultation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &ConsultationResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Expert Council Report"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Scope:".cyan().bold(), result.scope));
        output.push_str(&format!("{} {}\n\n", "Status:".cyan().bold(), Self::status_line(result)));

        if let Some(error) = &result.error {
            output.push_str(&format!("{} {}\n\n", "Error:".red().bold(), error));
        }

        if !result.experts.is_empty() {
            output.push_str(&Self::section_header("Experts"));
            for report in &result.experts {
                output.push_str(&Self::expert_section(report));
            }
        }

        if !result.findings.is_empty() {
            output.push_str(&Self::section_header("Findings"));
            for finding in &result.findings {
                output.push_str(&format!("{}\n", Self::finding_line(finding)));
            }
        }

        if !result.superseded.is_empty() {
            output.push_str(&Self::section_header("Revised During Review"));
            for entry in &result.superseded {
                output.push_str(&format!(
                    "  {} (superseded by {})\n",
                    entry.finding.summary_line().dimmed(),
                    entry.superseded_by
                ));
            }
        }

        if !result.narrative.is_empty() {
            output.push_str(&Self::section_header("Report"));
            output.push_str(&format!("\n{}\n", result.narrative));
        }

        if !result.warnings.is_empty() {
            output.push_str(&format!("\n{}\n", "Warnings:".yellow().bold()));
            for warning in &result.warnings {
                output.push_str(&format!("  * {}\n", warning));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(result: &ConsultationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Narrative only, with a one-line status
    pub fn format_summary(result: &ConsultationResult) -> String {
        let mut output = format!("{} {}\n\n", "Status:".dimmed(), Self::status_line(result));
        match (&result.error, result.narrative.is_empty()) {
            (Some(error), true) => {
                output.push_str(&format!("{} {}\n", "Error:".red().bold(), error))
            }
            _ => {
                output.push_str(&result.narrative);
                output.push('\n');
            }
        }
        output
    }

    fn status_line(result: &ConsultationResult) -> String {
        let status = match result.status {
            ConsultationStatus::Complete => result.status.as_str().green().bold(),
            ConsultationStatus::Partial => result.status.as_str().yellow().bold(),
            ConsultationStatus::Failed => result.status.as_str().red().bold(),
        };
        let path = match result.path {
            ExecutionPath::Council => "council",
            ExecutionPath::Parallel => "parallel",
            ExecutionPath::None => "no pipeline",
        };
        let seconds = result.elapsed_ms as f64 / 1000.0;
        let mut line = format!("{} via {} in {:.1}s", status, path, seconds);
        if result.timed_out {
            line.push_str(" (timed out)");
        }
        line
    }

    /// `── Security Analyst · completed · 12 tool calls · 5 iterations ──`
    fn expert_section(report: &ExpertReport) -> String {
        let title = format!(
            "── {} · {} · {} tool call{} · {} iteration{} · {:.1}s ──",
            report.display_name,
            report.status,
            report.tool_calls,
            if report.tool_calls == 1 { "" } else { "s" },
            report.iterations,
            if report.iterations == 1 { "" } else { "s" },
            report.elapsed_ms as f64 / 1000.0
        );
        let title = match report.status {
            SessionStatus::Completed => title.yellow().bold(),
            _ => title.red().bold(),
        };

        let mut section = format!("\n{}\n", title);
        if let Some(answer) = &report.answer {
            section.push_str(&format!("{}\n", answer.trim()));
        }
        if let Some(error) = &report.error {
            section.push_str(&format!("{} {}\n", "Error:".red(), error));
        }
        section
    }

    fn finding_line(finding: &Finding) -> String {
        let severity = Self::severity_label(finding.severity);
        let location = finding
            .location
            .as_deref()
            .map(|l| format!(" @ {}", l))
            .unwrap_or_default();
        format!(
            "  {} {} {}{} {} {}",
            finding.id.to_string().dimmed(),
            severity,
            finding.category.bold(),
            location,
            format!("({}, {:.2})", finding.expert.key(), finding.confidence).dimmed(),
            finding.description
        )
    }

    fn severity_label(severity: Severity) -> ColoredString {
        let label = format!("[{}]", severity.as_str().to_uppercase());
        match severity {
            Severity::Critical => label.red().bold(),
            Severity::High => label.red(),
            Severity::Medium => label.yellow(),
            Severity::Low => label.normal(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &ConsultationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &ConsultationResult) -> String {
        Self::format_json(result)
    }

    fn format_summary(&self, result: &ConsultationResult) -> String {
        Self::format_summary(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{ExpertKind, FindingId, Transcript};

    fn result() -> ConsultationResult {
        let report = ExpertReport {
            session_id: "security:0".to_string(),
            expert: ExpertKind::Security,
            display_name: "Security Analyst".to_string(),
            strategy: "single(deepseek-chat)".to_string(),
            status: SessionStatus::Completed,
            answer: Some("Tokens never expire.".to_string()),
            iterations: 3,
            tool_calls: 1,
            findings: 1,
            elapsed_ms: 4200,
            error: None,
            transcript: Transcript::new(),
        };
        let finding =
            Finding::new(ExpertKind::Security, Severity::High, "auth", "tokens never expire")
                .with_id(FindingId(1))
                .with_location("src/auth.rs:42");
        ConsultationResult {
            status: ConsultationStatus::Partial,
            path: ExecutionPath::Council,
            scope: "Review auth".to_string(),
            narrative: "Rotate tokens.".to_string(),
            findings: vec![finding],
            superseded: Vec::new(),
            reviews: Vec::new(),
            experts: vec![report],
            elapsed_ms: 12_300,
            timed_out: true,
            warnings: vec!["performance timed out".to_string()],
            error: None,
        }
    }

    #[test]
    fn test_full_output_has_expert_header_and_findings() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format(&result());
        assert!(output.contains("Scope: Review auth"));
        assert!(output.contains("Status: partial via council in 12.3s (timed out)"));
        let header = "── Security Analyst · completed · 1 tool call · 3 iterations · 4.2s ──";
        assert!(output.contains(header));
        assert!(output.contains("F1 [HIGH] auth @ src/auth.rs:42 (security, "));
        assert!(output.contains(") tokens never expire"));
        assert!(output.contains("Rotate tokens."));
        assert!(output.contains("  * performance timed out"));
    }

    #[test]
    fn test_summary_is_status_and_narrative() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format_summary(&result());
        assert_eq!(output, "Status: partial via council in 12.3s (timed out)\n\nRotate tokens.\n");
    }

    #[test]
    fn test_failed_result_shows_error() {
        colored::control::set_override(false);
        let failed = ConsultationResult::failed("x", "No expert roles could be resolved", 5);
        let error = "Error: No expert roles could be resolved";
        assert!(ConsoleFormatter::format_summary(&failed).contains(error));
        assert!(ConsoleFormatter::format(&failed).contains(error));
    }

    #[test]
    fn test_json_round_trips_status() {
        let rendered = ConsoleFormatter::format_json(&result());
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["status"], "partial");
        assert_eq!(json["findings"][0]["severity"], "high");
    }
}
