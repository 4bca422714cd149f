//! Configuration module
//!
//! Handles option merging, path resolution and runner settings.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{ParamOverride, RunParams};

pub const DEFAULT_XLT_VERSION: &str = "4.5.4";
pub const DEFAULT_SOURCES_DIR: &str = "src";
pub const DEFAULT_CLASSES_DIR: &str = "classes";
pub const DEFAULT_TEST_CASES_JAVA: &str = "**/T*.java";
pub const DEFAULT_TEST_CASES_CLASS: &str = "**/T*.class";
pub const DEFAULT_LOG4J_PROPERTIES: &str = "config/js-log4j.properties";
pub const LIB_DIR: &str = "lib";
pub const SOURCES_FILE: &str = "sources.txt";

/// Per-item timeout applied when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// User supplied options. Every field is optional; only the ones that are set
/// replace the current value when merged into [`XltPaths`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XltOptions {
    /// Project directory; the other directories are relative to it
    pub base_dir: Option<PathBuf>,
    pub test_src_dir: Option<String>,
    pub test_classes_dir: Option<String>,
    pub test_cases_java: Option<String>,
    pub test_cases_class: Option<String>,
    /// XLT installation, relative to `base_dir` unless absolute
    pub path_to_xlt: Option<String>,
    pub xlt_version: Option<String>,
    pub log4j_properties: Option<String>,
    pub xlt_web_driver: Option<String>,
}

impl XltOptions {
    /// Overlay `other` on top of `self`; set fields in `other` win
    pub fn overlay(mut self, other: &XltOptions) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        take!(
            base_dir,
            test_src_dir,
            test_classes_dir,
            test_cases_java,
            test_cases_class,
            path_to_xlt,
            xlt_version,
            log4j_properties,
            xlt_web_driver
        );
        self
    }
}

/// Resolved directories, patterns and defaults for one project
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XltPaths {
    base_dir: PathBuf,
    sources_dir: String,
    classes_dir: String,
    pub test_cases_java: String,
    pub test_cases_class: String,
    xlt_dir: String,
    pub xlt_version: String,
    /// Parameters used when a work item leaves a field unset
    pub default_params: RunParams,
}

impl Default for XltPaths {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./"),
            sources_dir: DEFAULT_SOURCES_DIR.to_string(),
            classes_dir: DEFAULT_CLASSES_DIR.to_string(),
            test_cases_java: DEFAULT_TEST_CASES_JAVA.to_string(),
            test_cases_class: DEFAULT_TEST_CASES_CLASS.to_string(),
            xlt_dir: format!("{LIB_DIR}/xlt-{DEFAULT_XLT_VERSION}"),
            xlt_version: DEFAULT_XLT_VERSION.to_string(),
            default_params: RunParams::new().log_config(DEFAULT_LOG4J_PROPERTIES),
        }
    }
}

impl XltPaths {
    pub fn from_options(options: &XltOptions) -> Self {
        let mut paths = Self::default();
        paths.apply(options);
        paths
    }

    /// Merge options; unset options keep their current value
    pub fn apply(&mut self, options: &XltOptions) {
        if let Some(base_dir) = &options.base_dir {
            self.base_dir = base_dir.clone();
        }
        if let Some(dir) = &options.test_src_dir {
            self.sources_dir = dir.clone();
        }
        if let Some(dir) = &options.test_classes_dir {
            self.classes_dir = dir.clone();
        }
        if let Some(pattern) = &options.test_cases_java {
            self.test_cases_java = pattern.clone();
        }
        if let Some(pattern) = &options.test_cases_class {
            self.test_cases_class = pattern.clone();
        }
        if let Some(version) = &options.xlt_version {
            self.xlt_version = version.clone();
            if options.path_to_xlt.is_none() {
                self.xlt_dir = format!("{LIB_DIR}/xlt-{version}");
            }
        }
        if let Some(path) = &options.path_to_xlt {
            self.xlt_dir = path.clone();
        }
        if let Some(log4j) = &options.log4j_properties {
            self.default_params.log_config_path = Some(log4j.clone());
        }
        if let Some(driver) = &options.xlt_web_driver {
            self.default_params.driver = Some(driver.clone());
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.base_dir.join(&self.sources_dir)
    }

    /// Classes directory as given, relative to the base directory
    pub fn classes_dir_name(&self) -> &str {
        &self.classes_dir
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.base_dir.join(&self.classes_dir)
    }

    pub fn xlt_dir(&self) -> PathBuf {
        self.base_dir.join(&self.xlt_dir)
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.base_dir.join(LIB_DIR)
    }

    pub fn sources_file(&self) -> PathBuf {
        self.base_dir.join(SOURCES_FILE)
    }

    /// Wildcard classpath entry for the XLT jars, relative to the base directory
    pub fn xlt_lib_classpath(&self) -> String {
        format!("{}/lib/*", self.xlt_dir.trim_end_matches('/'))
    }
}

/// Scheduler settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Concurrency limit; host parallelism when unset
    pub max_concurrent: Option<usize>,

    /// Per-item timeout in seconds; 0 disables it
    pub timeout_secs: u64,

    /// Ordered pattern overrides, later entries win
    pub overrides: Vec<ParamOverride>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            overrides: Vec::new(),
        }
    }
}
