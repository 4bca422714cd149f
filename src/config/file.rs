//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{RunnerConfig, XltOptions};
use crate::models::{ParamOverride, RunParams};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./xlt-runner.yaml",
    "./xlt-runner.yml",
    "./xlt-runner.json",
    "./.xlt-runner.yaml",
    "~/.config/xlt-runner/config.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Project layout and XLT settings
    #[serde(default)]
    pub xlt: XltOptions,

    /// Scheduler settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            xlt: XltOptions::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        if self.runner.max_concurrent == Some(0) {
            anyhow::bail!("runner.max_concurrent must be at least 1");
        }

        for o in &self.runner.overrides {
            Regex::new(&o.pattern)
                .with_context(|| format!("Invalid override pattern: {}", o.pattern))?;
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            version: default_version(),
            xlt: XltOptions {
                base_dir: Some(PathBuf::from("./")),
                test_src_dir: Some("src".to_string()),
                test_classes_dir: Some("classes".to_string()),
                xlt_version: Some(super::DEFAULT_XLT_VERSION.to_string()),
                xlt_web_driver: Some("chrome_clientperformance".to_string()),
                ..Default::default()
            },
            runner: RunnerConfig {
                max_concurrent: Some(4),
                timeout_secs: super::DEFAULT_TIMEOUT_SECS,
                overrides: vec![ParamOverride::new(
                    "mobile/",
                    RunParams::new().driver("chrome").window(375, 812),
                )],
            },
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.version, "1.0");
        assert!(config.runner.overrides.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xlt-runner.yaml");

        let config = ConfigFile::example();
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.xlt, config.xlt);
        assert_eq!(loaded.runner, config.runner);
    }

    #[test]
    fn test_config_file_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xlt-runner.json");
        std::fs::write(
            &path,
            r#"{"xlt":{"path_to_xlt":"../XLT"},"runner":{"timeout_secs":30,"overrides":[{"pattern":"T.*","params":{"width":800}}]}}"#,
        )
        .unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.xlt.path_to_xlt.as_deref(), Some("../XLT"));
        assert_eq!(loaded.runner.timeout_secs, 30);
        assert_eq!(loaded.runner.max_concurrent, None);
        assert_eq!(loaded.runner.overrides[0].params.width, Some(800));
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let mut config = ConfigFile::default();
        config
            .runner
            .overrides
            .push(ParamOverride::new("[unclosed", RunParams::new()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = ConfigFile::default();
        config.runner.max_concurrent = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("./test.yaml");
        assert_eq!(path, PathBuf::from("./test.yaml"));
    }
}
