//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Model identifiers an expert can be bound to (Value Object)
///
/// Well-known identifiers get their own variant; anything else the
/// provider understands is carried verbatim in [`Model::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // DeepSeek models
    DeepSeekChat,
    DeepSeekReasoner,
    // GPT models
    Gpt5,
    Gpt5Mini,
    Gpt41,
    Gpt41Mini,
    // Claude models
    ClaudeSonnet45,
    ClaudeHaiku45,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::DeepSeekChat => "deepseek-chat",
            Model::DeepSeekReasoner => "deepseek-reasoner",
            Model::Gpt5 => "gpt-5",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt41Mini => "gpt-4.1-mini",
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::Custom(s) => s,
        }
    }

    /// Default model for the deep-analysis half of a decoupled expert
    pub fn default_analysis() -> Model {
        Model::DeepSeekReasoner
    }

    /// Whether the model is a dedicated reasoning model.
    ///
    /// Reasoning models are slow and expensive per call, so they make a poor
    /// choice for the tool-orchestration half of a decoupled expert.
    pub fn is_reasoning(&self) -> bool {
        matches!(self, Model::DeepSeekReasoner | Model::Gpt5)
    }

    /// Whether the identifier is empty (only possible for custom models)
    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl Default for Model {
    /// Returns the default model (deepseek-chat)
    fn default() -> Self {
        Model::DeepSeekChat
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "deepseek-chat" => Model::DeepSeekChat,
            "deepseek-reasoner" => Model::DeepSeekReasoner,
            "gpt-5" => Model::Gpt5,
            "gpt-5-mini" => Model::Gpt5Mini,
            "gpt-4.1" => Model::Gpt41,
            "gpt-4.1-mini" => Model::Gpt41Mini,
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse::<Model>();
        Ok(model)
    }
}
