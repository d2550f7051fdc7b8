//! Model provider configuration from TOML (`[provider]` section)
//!
//! Any OpenAI-compatible chat-completions endpoint works.

use super::ConfigValidationError;
use super::council::parse_model;
use council_domain::Model;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Model every role uses unless overridden
    pub default_model: Option<String>,
    /// Analysis model for roles run with the decoupled strategy
    pub analysis_model: Option<String>,
    pub max_tokens: u32,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            default_model: None,
            analysis_model: None,
            max_tokens: 8192,
        }
    }
}

impl FileProviderConfig {
    pub fn parse_default_model(&self) -> Result<Option<Model>, ConfigValidationError> {
        parse_model("provider.default_model", self.default_model.as_deref())
    }

    pub fn parse_analysis_model(&self) -> Result<Option<Model>, ConfigValidationError> {
        parse_model("provider.analysis_model", self.analysis_model.as_deref())
    }
}
