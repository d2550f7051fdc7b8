//! CLI command definitions

use clap::{Parser, ValueEnum};
use council_domain::{ConsultationMode, ConsultationRequest, StrategyKind};
use std::path::PathBuf;

/// Output format for consultation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Per-expert reports, findings and the final narrative
    Full,
    /// Only the final narrative
    Summary,
    /// The complete result as JSON
    Json,
}

/// CLI arguments for expert-council
#[derive(Parser, Debug)]
#[command(name = "expert-council")]
#[command(author, version, about = "Consult a council of tool-using LLM experts")]
#[command(long_about = r#"
Expert Council sends a question about your codebase to several LLM experts.
Each expert investigates with read-only tools and reports findings.

In council mode (the default with two or more experts) a coordinator plans the
work, the experts run in parallel, cross-review each other's findings, and a
moderator synthesizes the final report. Parallel mode skips planning and review.

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables (COUNCIL_LIMITS__MAX_ITERATIONS=20)
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/expert-council/config.toml   Global config

Example:
  expert-council "Review the session handling in src/auth"
  expert-council -r security -r performance --mode parallel "Audit the upload path"
  expert-council -r architect --context @docs/design.md "Is this layering sound?"
"#)]
pub struct Cli {
    /// What the experts should look into
    #[arg(value_name = "SCOPE")]
    pub scope: Option<String>,

    /// Expert roles to consult (can be specified multiple times)
    #[arg(short, long = "role", value_name = "ROLE")]
    pub roles: Vec<String>,

    /// How the experts work together: single, council (alias: debate) or parallel
    #[arg(long, value_name = "MODE", value_parser = parse_mode)]
    pub mode: Option<ConsultationMode>,

    /// Extra context for the experts, inline or `@path` to read a file
    #[arg(long, value_name = "TEXT|@FILE")]
    pub context: Option<String>,

    /// Restrict experts to these tools (can be specified multiple times)
    #[arg(long = "tools", value_name = "TOOL")]
    pub tools: Vec<String>,

    /// Separate tool use from analysis (a second, deeper model concludes)
    #[arg(long)]
    pub decoupled: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the merged configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// List the available expert roles and exit
    #[arg(long)]
    pub list_roles: bool,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

fn parse_mode(s: &str) -> Result<ConsultationMode, String> {
    s.parse().map_err(|e: council_domain::DomainError| e.to_string())
}

impl Cli {
    /// Build the consultation request; `None` without a scope.
    ///
    /// `context` is the already-resolved `--context` text.
    pub fn to_request(&self, context: Option<String>) -> Option<ConsultationRequest> {
        let scope = self.scope.as_deref()?;
        let mut request = ConsultationRequest::new(scope).with_roles(self.roles.iter().cloned());
        if let Some(mode) = self.mode {
            request = request.with_mode(mode);
        }
        if let Some(context) = context {
            request = request.with_context(context);
        }
        if !self.tools.is_empty() {
            request = request.with_tool_allowlist(self.tools.clone());
        }
        if self.decoupled {
            request = request.with_strategy(StrategyKind::Decoupled);
        }
        Some(request)
    }
}

/// `--context` value: `@path` reads the file, anything else is literal text
pub fn resolve_context(raw: &str) -> std::io::Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path.trim()),
        None => Ok(raw.to_string()),
    }
}
