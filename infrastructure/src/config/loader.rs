//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "expert-council";
const PROJECT_FILES: [&str; 2] = ["council.toml", ".council.toml"];
const ENV_PREFIX: &str = "COUNCIL_";

/// One place configuration may come from
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub path: Option<PathBuf>,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `COUNCIL_` prefix, `__` between sections
    ///    (`COUNCIL_LIMITS__MAX_ITERATIONS=20`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./council.toml` or `./.council.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/expert-council/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::load_from(Self::global_config_path().as_deref(), Path::new("."), config_path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// File layers only, rooted at `project_dir`
    pub(crate) fn load_from(
        global: Option<&Path>,
        project_dir: &Path,
        explicit: Option<&Path>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global) = global
            && global.exists()
        {
            figment = figment.merge(Toml::file(global));
        }

        if let Some(project) = Self::find_project_config(project_dir) {
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/expert-council/config.toml` or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::find_project_config(Path::new("."))
    }

    fn find_project_config(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Every source in priority order, for `--show-config`
    pub fn sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                path: Some(path.to_path_buf()),
                found: path.exists(),
            });
        }
        let project = Self::project_config_path();
        sources.push(ConfigSource {
            label: "Project",
            found: project.is_some(),
            path: project,
        });
        let global = Self::global_config_path();
        sources.push(ConfigSource {
            label: "Global",
            found: global.as_deref().is_some_and(Path::exists),
            path: global,
        });
        sources.push(ConfigSource {
            label: "Default",
            path: None,
            found: true,
        });
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn extract(figment: Figment) -> FileConfig {
        figment.extract().unwrap()
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.council.enabled);
        assert_eq!(config.limits.max_concurrent_experts, 3);
    }

    #[test]
    fn test_global_config_path_names_the_app() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.to_string_lossy().contains("expert-council"));
        }
    }

    #[test]
    fn test_layers_merge_in_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "[limits]\nmax_iterations = 10\nmax_concurrent_experts = 5\n").unwrap();

        let project_dir = dir.path().join("project");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join(".council.toml"), "[limits]\nmax_iterations = 20\n").unwrap();

        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[council]\nenabled = false\n").unwrap();

        let config = extract(ConfigLoader::load_from(Some(&global), &project_dir, Some(&explicit)));
        assert_eq!(config.limits.max_iterations, 20);
        assert_eq!(config.limits.max_concurrent_experts, 5);
        assert!(!config.council.enabled);
        // untouched fields keep their defaults
        assert_eq!(config.limits.expert_timeout_secs, 600);
    }

    #[test]
    fn test_council_toml_wins_over_dotfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("council.toml"), "[council]\ndedup = \"file\"\n").unwrap();
        fs::write(dir.path().join(".council.toml"), "[council]\ndedup = \"location\"\n").unwrap();

        let config = extract(ConfigLoader::load_from(None, dir.path(), None));
        assert_eq!(config.council.dedup, "file");
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config = extract(ConfigLoader::load_from(Some(&missing), dir.path(), None));
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_sources_list_explicit_first() {
        let sources = ConfigLoader::sources(Some(Path::new("/definitely/missing.toml")));
        assert_eq!(sources[0].label, "Explicit");
        assert!(!sources[0].found);
        assert_eq!(sources.last().map(|s| s.label), Some("Default"));
    }
}
