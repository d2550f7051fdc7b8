//! Prompt templates for the consultation flow

use crate::consultation::plan::PlannedTask;
use crate::consultation::review::ReviewVerdict;
use crate::expert::role::{ExpertKind, ExpertRole};
use crate::findings::entities::Finding;
use crate::prompt::persona::persona_for;
use crate::tool::entities::ToolDefinition;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

/// Line format experts use to report findings
const FINDINGS_FORMAT: &str = r#"Report every finding on its own line in exactly this format:

- [SEVERITY] category @ path/to/file.rs:LINE (confidence 0.0-1.0): description

SEVERITY is one of CRITICAL, HIGH, MEDIUM, LOW. Omit "@ location" when a finding is not tied to a file.
Only report what you verified with tools or can justify from the provided context."#;

impl PromptTemplate {
    /// Built-in persona text for `kind`
    pub fn persona(kind: ExpertKind) -> &'static str {
        persona_for(kind)
    }

    /// System prompt for an expert session
    pub fn expert_system(role: &ExpertRole, tools: &[ToolDefinition]) -> String {
        let mut prompt = format!("{}\n\n", role.prompt.trim());

        if tools.is_empty() {
            prompt.push_str(
                "You have no tools in this consultation; work from the provided context.\n\n",
            );
        } else {
            prompt.push_str("You can investigate the codebase with these tools:\n");
            for tool in tools {
                prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            }
            prompt.push_str(
                "\nUse tools to verify claims before reporting them. When you have enough evidence, stop calling tools and give your final analysis.\n\n",
            );
        }

        prompt.push_str(FINDINGS_FORMAT);
        prompt
    }

    /// First user turn of an expert session
    pub fn expert_task(scope: &str, context: Option<&str>, task: Option<&PlannedTask>) -> String {
        let mut prompt = format!("## Consultation\n\n{}\n", scope.trim());
        if let Some(context) = context {
            prompt.push_str(&format!("\n## Context\n\n{}\n", context.trim()));
        }
        if let Some(task) = task {
            prompt.push_str(&format!("\n## Your Assignment\n\n{}\n", task.task));
            if !task.focus_areas.is_empty() {
                prompt.push_str("\nFocus areas:\n");
                for area in &task.focus_areas {
                    prompt.push_str(&format!("- {}\n", area));
                }
            }
        }
        prompt
    }

    /// Instruction for the analysis model of a decoupled expert
    pub fn analysis_instruction() -> &'static str {
        "Based on the tool results above, provide your final expert analysis. \
         Be thorough and specific, and report findings in the required line format."
    }

    /// Instruction when an expert is forced to stop calling tools
    pub fn conclude_instruction(max_iterations: u32) -> String {
        format!(
            "You have used all {} tool calls available in this consultation. \
             Do not request more tools. Give your final analysis now from the evidence gathered, \
             reporting findings in the required line format.",
            max_iterations
        )
    }

    /// System prompt for the council coordinator's planning call
    pub fn plan_system() -> &'static str {
        r#"You are the coordinator of an expert council. Break the consultation into one focused task per expert so that their work overlaps as little as possible.
Respond with JSON only:
{"goal": "one sentence", "tasks": [{"role": "<role key>", "task": "what this expert should investigate", "focus_areas": ["..."]}]}
Use only the role keys listed."#
    }

    pub fn plan_prompt(scope: &str, context: Option<&str>, roles: &[&ExpertRole]) -> String {
        let mut prompt = format!("## Consultation Request\n\n{}\n", scope.trim());
        if let Some(context) = context {
            prompt.push_str(&format!("\n## Context\n\n{}\n", context.trim()));
        }
        prompt.push_str("\n## Available Experts\n\n");
        for role in roles {
            prompt.push_str(&format!("- {}: {}\n", role.key(), role.display_name));
        }
        prompt.push_str("\nCreate a research plan with one task per expert.");
        prompt
    }

    /// System prompt for one expert's cross-review call
    pub fn review_system(reviewer: &ExpertRole) -> String {
        format!(
            r#"{}

You are now reviewing the findings of the other experts on the council. For each finding, decide whether you agree, disagree, or have nothing to add. Then list important issues nobody reported.
Respond with JSON only:
{{"agreements": ["F1"], "disagreements": [{{"finding": "F2", "reason": "...", "severity": "low", "confidence": 0.4}}], "gaps": [{{"severity": "high", "category": "...", "location": "path:line", "description": "...", "confidence": 0.7}}]}}
Disagree only with a concrete reason."#,
            reviewer.prompt.trim()
        )
    }

    pub fn review_prompt(scope: &str, own_answer: Option<&str>, findings: &[Finding]) -> String {
        let mut prompt = format!("## Consultation\n\n{}\n", scope.trim());
        if let Some(answer) = own_answer {
            prompt.push_str(&format!("\n## Your Own Analysis\n\n{}\n", answer.trim()));
        }
        prompt.push_str("\n## Findings From Other Experts\n\n");
        if findings.is_empty() {
            prompt.push_str("(none)\n");
        }
        for finding in findings {
            prompt.push_str(&format!("- {}\n", finding.summary_line()));
        }
        prompt
    }

    /// System prompt for the final synthesis
    pub fn synthesis_system() -> &'static str {
        r#"You are the moderator of an expert council. Write the final report from the findings below.
1. Lead with the most severe, best supported issues.
2. Group related findings and name the experts who raised them.
3. Where experts disagree, present both positions and what evidence would settle it. Do not invent consensus.
4. End with a short prioritized list of recommended actions.
Be concise and concrete."#
    }

    pub fn synthesis_prompt(
        scope: &str,
        findings: &[Finding],
        reviews: &[ReviewVerdict],
        notes: &[String],
    ) -> String {
        let mut prompt = format!("## Consultation\n\n{}\n\n## Findings\n\n", scope.trim());
        if findings.is_empty() {
            prompt.push_str("(no findings were reported)\n");
        }
        for finding in findings {
            prompt.push_str(&format!("- {}\n", finding.summary_line()));
        }

        let disagreements: Vec<String> = reviews
            .iter()
            .flat_map(|r| {
                let reviewer = r.reviewer.display_name();
                r.disagreements
                    .iter()
                    .map(move |d| format!("- {} disputes {}: {}", reviewer, d.finding_id, d.reason))
            })
            .collect();
        if !disagreements.is_empty() {
            prompt.push_str("\n## Disagreements\n\n");
            prompt.push_str(&disagreements.join("\n"));
            prompt.push('\n');
        }

        if !notes.is_empty() {
            prompt.push_str("\n## Notes\n\n");
            for note in notes {
                prompt.push_str(&format!("- {}\n", note));
            }
        }
        prompt
    }
}
