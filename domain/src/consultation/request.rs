//! Consultation requests

use crate::core::error::DomainError;
use crate::expert::strategy::StrategyKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the experts of one consultation work together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationMode {
    /// Only the first requested expert is consulted
    Single,
    /// Plan, execute, cross-review and synthesize (needs two or more experts)
    #[default]
    Council,
    /// Independent experts, merged without review
    Parallel,
}

impl ConsultationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationMode::Single => "single",
            ConsultationMode::Council => "council",
            ConsultationMode::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for ConsultationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConsultationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(ConsultationMode::Single),
            "council" | "debate" => Ok(ConsultationMode::Council),
            "parallel" => Ok(ConsultationMode::Parallel),
            other => Err(DomainError::InvalidMode(other.to_string())),
        }
    }
}

/// The task handed to one or more experts. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    scope: String,
    context: Option<String>,
    /// Role names as given by the caller; resolved against the catalog later
    roles: Vec<String>,
    tool_allowlist: Option<Vec<String>>,
    mode: ConsultationMode,
    strategy: Option<StrategyKind>,
}

impl ConsultationRequest {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            context: None,
            roles: Vec::new(),
            tool_allowlist: None,
            mode: ConsultationMode::default(),
            strategy: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_tool_allowlist(mut self, tools: Vec<String>) -> Self {
        self.tool_allowlist = Some(tools);
        self
    }

    pub fn with_mode(mut self, mode: ConsultationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn tool_allowlist(&self) -> Option<&[String]> {
        self.tool_allowlist.as_deref()
    }

    pub fn mode(&self) -> ConsultationMode {
        self.mode
    }

    pub fn strategy(&self) -> Option<StrategyKind> {
        self.strategy
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.scope.trim().is_empty() {
            return Err(DomainError::EmptyScope);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debate_is_an_alias_for_council() {
        assert_eq!("debate".parse::<ConsultationMode>().unwrap(), ConsultationMode::Council);
        assert_eq!("PARALLEL".parse::<ConsultationMode>().unwrap(), ConsultationMode::Parallel);
        assert!("swarm".parse::<ConsultationMode>().is_err());
    }

    #[test]
    fn test_builder() {
        let request = ConsultationRequest::new("Review the auth flow")
            .with_roles(["security", "architect"])
            .with_context("   ")
            .with_mode(ConsultationMode::Parallel)
            .with_tool_allowlist(vec!["search_code".to_string()]);

        assert_eq!(request.roles(), &["security".to_string(), "architect".to_string()]);
        assert!(request.context().is_none());
        assert_eq!(request.mode(), ConsultationMode::Parallel);
        assert_eq!(request.tool_allowlist().unwrap().len(), 1);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_scope_is_invalid() {
        assert_eq!(ConsultationRequest::new("  ").validate(), Err(DomainError::EmptyScope));
    }
}
