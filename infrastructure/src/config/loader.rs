//! Configuration loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Environment variable prefix; `QUORUM_BENCH_RUNNER__QUESTION_PARALLELISM=8`
/// sets `runner.question_parallelism`.
pub const ENV_PREFIX: &str = "QUORUM_BENCH_";

const PROJECT_FILE: &str = "quorum-bench.toml";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority.
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// The merged provider chain.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(project) = Self::project_config_path() {
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/quorum-bench/config.toml`, or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("quorum-bench").join("config.toml"))
    }

    /// The project-level config file, if present
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_FILE);
        path.exists().then_some(path)
    }

    /// Config file locations from highest to lowest priority, with whether
    /// each one exists.
    pub fn config_sources(config_path: Option<&Path>) -> Vec<(&'static str, PathBuf, bool)> {
        let mut sources = Vec::new();
        if let Some(path) = config_path {
            sources.push(("Explicit", path.to_path_buf(), path.exists()));
        }
        let project = PathBuf::from(PROJECT_FILE);
        let found = project.exists();
        sources.push(("Project", project, found));
        if let Some(path) = Self::global_config_path() {
            let found = path.exists();
            sources.push(("Global", path, found));
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.models.ensemble.is_empty());
        assert_eq!(config.runner.question_parallelism, 4);
    }

    #[test]
    fn test_global_config_path_names_the_tool() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.to_string_lossy().contains("quorum-bench"));
        }
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[models]
ensemble = ["openai:gpt-4.1", "anthropic:claude-sonnet-4"]

[runner]
question_parallelism = 2
"#
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&path)).extract().unwrap();
        assert_eq!(config.models.ensemble.len(), 2);
        assert_eq!(config.runner.question_parallelism, 2);
        // Untouched sections keep defaults
        assert_eq!(config.consensus.top_n, 3);
    }

    #[test]
    fn test_env_overrides_project_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(PROJECT_FILE, "[runner]\nquestion_parallelism = 2\n")?;
            jail.set_env("QUORUM_BENCH_RUNNER__QUESTION_PARALLELISM", "9");
            jail.set_env("QUORUM_BENCH_REGRESSION__HOLM", "true");
            let config: FileConfig = ConfigLoader::figment(None).extract()?;
            assert_eq!(config.runner.question_parallelism, 9);
            assert!(config.regression.holm);
            Ok(())
        });
    }

    #[test]
    fn test_project_file_is_read() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(PROJECT_FILE, "[consensus]\nstrategies = [\"elo\"]\ntop_n = 2\n")?;
            let config: FileConfig = ConfigLoader::figment(None).extract()?;
            assert_eq!(config.consensus.strategies, vec!["elo".to_string()]);
            assert_eq!(config.consensus.top_n, 2);
            Ok(())
        });
    }
}
