//! Expert roles

use crate::core::{error::DomainError, model::Model};
use crate::expert::strategy::{ReasoningStrategy, StrategyKind};
use crate::prompt::PromptTemplate;
use crate::tool::names;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The fixed set of expert personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertKind {
    Architect,
    PlanReviewer,
    ScopeAnalyst,
    CodeReviewer,
    Security,
    Performance,
    Documentation,
}

impl ExpertKind {
    pub const ALL: [ExpertKind; 7] = [
        ExpertKind::Architect,
        ExpertKind::PlanReviewer,
        ExpertKind::ScopeAnalyst,
        ExpertKind::CodeReviewer,
        ExpertKind::Security,
        ExpertKind::Performance,
        ExpertKind::Documentation,
    ];

    /// Registry key (also used in config files and on the command line)
    pub fn key(&self) -> &'static str {
        match self {
            ExpertKind::Architect => "architect",
            ExpertKind::PlanReviewer => "plan_reviewer",
            ExpertKind::ScopeAnalyst => "scope_analyst",
            ExpertKind::CodeReviewer => "code_reviewer",
            ExpertKind::Security => "security",
            ExpertKind::Performance => "performance",
            ExpertKind::Documentation => "documentation",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExpertKind::Architect => "Architect",
            ExpertKind::PlanReviewer => "Plan Reviewer",
            ExpertKind::ScopeAnalyst => "Scope Analyst",
            ExpertKind::CodeReviewer => "Code Reviewer",
            ExpertKind::Security => "Security Analyst",
            ExpertKind::Performance => "Performance Engineer",
            ExpertKind::Documentation => "Documentation Writer",
        }
    }

    /// Category assigned to findings that do not name one
    pub fn default_category(&self) -> &'static str {
        match self {
            ExpertKind::Architect => "architecture",
            ExpertKind::PlanReviewer => "plan",
            ExpertKind::ScopeAnalyst => "scope",
            ExpertKind::CodeReviewer => "code_quality",
            ExpertKind::Security => "security",
            ExpertKind::Performance => "performance",
            ExpertKind::Documentation => "documentation",
        }
    }

    /// Tools the role may use unless configuration says otherwise
    pub fn default_tools(&self) -> Vec<String> {
        let mut tools: Vec<String> = names::CODE_LOOKUP.iter().map(|s| s.to_string()).collect();
        tools.push(names::RECALL.to_string());
        if matches!(
            self,
            ExpertKind::Architect | ExpertKind::Security | ExpertKind::Performance
        ) {
            tools.push(names::WEB_SEARCH.to_string());
        }
        tools
    }
}

impl std::fmt::Display for ExpertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ExpertKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "architect" => Ok(ExpertKind::Architect),
            "plan_reviewer" => Ok(ExpertKind::PlanReviewer),
            "scope_analyst" => Ok(ExpertKind::ScopeAnalyst),
            "code_reviewer" | "reviewer" => Ok(ExpertKind::CodeReviewer),
            "security" | "security_analyst" => Ok(ExpertKind::Security),
            "performance" | "perf" => Ok(ExpertKind::Performance),
            "documentation" | "documentation_writer" | "docs" => Ok(ExpertKind::Documentation),
            _ => Err(DomainError::UnknownRole(s.to_string())),
        }
    }
}

/// A named persona: model binding, tool subset and prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertRole {
    pub kind: ExpertKind,
    pub display_name: String,
    pub default_model: Model,
    /// Deep-analysis model; when set the role reasons in decoupled mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_model: Option<Model>,
    pub allowed_tools: Vec<String>,
    pub prompt: String,
}

impl ExpertRole {
    /// The built-in definition of `kind`, bound to `model`
    pub fn builtin(kind: ExpertKind, model: Model) -> Self {
        Self {
            kind,
            display_name: kind.display_name().to_string(),
            default_model: model,
            analysis_model: None,
            allowed_tools: kind.default_tools(),
            prompt: PromptTemplate::persona(kind).to_string(),
        }
    }

    pub fn key(&self) -> &'static str {
        self.kind.key()
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.default_model = model;
        self
    }

    pub fn with_analysis_model(mut self, model: Model) -> Self {
        self.analysis_model = Some(model);
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// The role's own strategy: decoupled iff an analysis model is configured
    pub fn strategy(&self) -> ReasoningStrategy {
        match &self.analysis_model {
            Some(analysis) => ReasoningStrategy::Decoupled {
                dialogue: self.default_model.clone(),
                analysis: analysis.clone(),
            },
            None => ReasoningStrategy::Single {
                model: self.default_model.clone(),
            },
        }
    }

    /// Strategy after applying a per-request override.
    ///
    /// Forcing `Decoupled` on a role without an analysis model pairs it with
    /// `fallback_analysis`.
    pub fn strategy_for(
        &self,
        kind: Option<StrategyKind>,
        fallback_analysis: &Model,
    ) -> ReasoningStrategy {
        match kind {
            None => self.strategy(),
            Some(StrategyKind::Single) => ReasoningStrategy::Single {
                model: self.default_model.clone(),
            },
            Some(StrategyKind::Decoupled) => ReasoningStrategy::Decoupled {
                dialogue: self.default_model.clone(),
                analysis: self
                    .analysis_model
                    .clone()
                    .unwrap_or_else(|| fallback_analysis.clone()),
            },
        }
    }
}
