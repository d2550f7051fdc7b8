//! Council configuration from TOML (`[council]` section)

use super::ConfigValidationError;
use council_domain::{DedupGranularity, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Multi-expert requests use the council unless this is false
    pub enabled: bool,
    /// Model for the planning call
    pub coordinator_model: Option<String>,
    /// Model for the final synthesis
    pub synthesis_model: Option<String>,
    /// `location` (file and line) or `file`
    pub dedup: String,
    /// Roles consulted when a request names none
    pub default_roles: Vec<String>,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            coordinator_model: None,
            synthesis_model: None,
            dedup: "location".to_string(),
            default_roles: vec![
                "architect".to_string(),
                "code_reviewer".to_string(),
                "security".to_string(),
            ],
        }
    }
}

impl FileCouncilConfig {
    pub fn parse_dedup(&self) -> Result<DedupGranularity, ConfigValidationError> {
        self.dedup
            .parse()
            .map_err(|_| ConfigValidationError::InvalidDedup(self.dedup.clone()))
    }

    pub fn parse_coordinator_model(&self) -> Result<Option<Model>, ConfigValidationError> {
        parse_model("council.coordinator_model", self.coordinator_model.as_deref())
    }

    pub fn parse_synthesis_model(&self) -> Result<Option<Model>, ConfigValidationError> {
        parse_model("council.synthesis_model", self.synthesis_model.as_deref())
    }
}

/// A configured model name; blank names are rejected
pub(crate) fn parse_model(
    field: &'static str,
    name: Option<&str>,
) -> Result<Option<Model>, ConfigValidationError> {
    match name {
        None => Ok(None),
        Some(name) if name.trim().is_empty() => {
            Err(ConfigValidationError::EmptyModelName(field.to_string()))
        }
        Some(name) => {
            let Ok(model) = name.trim().parse::<Model>();
            Ok(Some(model))
        }
    }
}
