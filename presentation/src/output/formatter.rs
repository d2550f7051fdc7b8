//! Output formatter trait

use council_domain::ConsultationResult;

/// Trait for formatting consultation results
pub trait OutputFormatter {
    /// Expert reports, findings and the narrative
    fn format(&self, result: &ConsultationResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &ConsultationResult) -> String;

    /// The narrative only (concise output)
    fn format_summary(&self, result: &ConsultationResult) -> String;
}
