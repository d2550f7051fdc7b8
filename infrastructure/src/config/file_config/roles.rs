//! Per-role overrides from TOML (`[roles.<key>]` tables)
//!
//! ```toml
//! [roles.security]
//! model = "gpt-5"
//! analysis_model = "deepseek-reasoner"
//! tools = ["search_code", "read_file", "web_search"]
//! ```

use super::ConfigValidationError;
use super::council::parse_model;
use council_domain::{ExpertKind, ExpertRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoleConfig {
    pub model: Option<String>,
    /// Setting this switches the role to the decoupled strategy
    pub analysis_model: Option<String>,
    pub tools: Option<Vec<String>>,
    /// Replaces the built-in persona
    pub prompt: Option<String>,
}

impl FileRoleConfig {
    /// Apply these overrides to `role`
    pub fn apply(&self, role: ExpertRole) -> Result<ExpertRole, ConfigValidationError> {
        let key = role.key();
        let mut role = role;
        if let Some(model) = parse_model("roles.model", self.model.as_deref())? {
            role = role.with_model(model);
        }
        if let Some(model) = parse_model("roles.analysis_model", self.analysis_model.as_deref())? {
            role = role.with_analysis_model(model);
        }
        if let Some(tools) = &self.tools {
            role = role.with_tools(tools.clone());
        }
        if let Some(prompt) = &self.prompt {
            if prompt.trim().is_empty() {
                return Err(ConfigValidationError::EmptyPrompt(key.to_string()));
            }
            role = role.with_prompt(prompt.clone());
        }
        Ok(role)
    }
}

pub(crate) fn parse_role_key(key: &str) -> Result<ExpertKind, ConfigValidationError> {
    key.parse()
        .map_err(|_| ConfigValidationError::UnknownRole(key.to_string()))
}
