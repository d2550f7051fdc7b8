//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. They are deserialized
//! directly and converted into the immutable [`ConsultationConfig`] and
//! [`RoleCatalog`] snapshots the application runs on.

mod council;
mod limits;
mod logging;
mod provider;
mod roles;
mod tools;

pub use council::FileCouncilConfig;
pub use limits::FileLimitsConfig;
pub use logging::FileLoggingConfig;
pub use provider::FileProviderConfig;
pub use roles::FileRoleConfig;
pub use tools::FileToolsConfig;

use council_application::ConsultationConfig;
use council_domain::{Model, RoleCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("limits.max_iterations cannot be 0")]
    ZeroIterations,

    #[error("{0} cannot be 0")]
    ZeroConcurrency(&'static str),

    #[error("{0}: model name cannot be empty")]
    EmptyModelName(String),

    #[error("council.dedup: unknown granularity '{0}' (expected 'location' or 'file')")]
    InvalidDedup(String),

    #[error("roles.{0}: unknown role")]
    UnknownRole(String),

    #[error("roles.{0}.prompt cannot be empty")]
    EmptyPrompt(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub limits: FileLimitsConfig,
    pub council: FileCouncilConfig,
    pub tools: FileToolsConfig,
    pub provider: FileProviderConfig,
    /// Overrides keyed by role (`[roles.security]`)
    pub roles: BTreeMap<String, FileRoleConfig>,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every issue found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = self.limits.validate();

        let checks = [
            self.council.parse_dedup().err(),
            self.council.parse_coordinator_model().err(),
            self.council.parse_synthesis_model().err(),
            self.provider.parse_default_model().err(),
            self.provider.parse_analysis_model().err(),
        ];
        issues.extend(checks.into_iter().flatten());

        if let Err(e) = self.to_role_catalog() {
            issues.push(e);
        }
        issues
    }

    /// The consultation settings this file describes
    pub fn to_consultation_config(&self) -> Result<ConsultationConfig, ConfigValidationError> {
        if let Some(issue) = self.limits.validate().into_iter().next() {
            return Err(issue);
        }
        let default_model = self.provider.parse_default_model()?.unwrap_or_default();
        let analysis_model = self
            .provider
            .parse_analysis_model()?
            .unwrap_or_else(Model::default_analysis);

        let mut config = ConsultationConfig::default()
            .with_limits(self.limits.to_limits())
            .with_council_enabled(self.council.enabled)
            .with_dedup(self.council.parse_dedup()?)
            .with_retry(self.tools.retry_policy())
            .with_default_roles(self.council.default_roles.clone());
        config.coordinator_model = self.council.parse_coordinator_model()?.unwrap_or(default_model);
        config.synthesis_model = self
            .council
            .parse_synthesis_model()?
            .unwrap_or_else(|| analysis_model.clone());
        config.fallback_analysis_model = analysis_model;
        config.tool_allowlist = self.tools.allowed.clone();
        Ok(config)
    }

    /// Built-in roles bound to the provider's default model, with the
    /// `[roles.*]` overrides applied
    pub fn to_role_catalog(&self) -> Result<RoleCatalog, ConfigValidationError> {
        let default_model = self.provider.parse_default_model()?.unwrap_or_default();
        let mut catalog = RoleCatalog::builtin_with_model(&default_model);

        for (key, overrides) in &self.roles {
            let kind = roles::parse_role_key(key)?;
            let Some(role) = catalog.get(kind).cloned() else {
                return Err(ConfigValidationError::UnknownRole(key.clone()));
            };
            catalog = catalog.with_role(overrides.apply(role)?);
        }
        Ok(catalog)
    }

    /// Render the merged configuration as TOML (for `--show-config`)
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
