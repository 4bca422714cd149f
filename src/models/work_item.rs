//! Work item models
//!
//! A work item is one compiled test class plus the JVM parameters it runs with.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{XltError, XltResult};

/// Suffix of compiled Java classes
pub const CLASS_SUFFIX: &str = ".class";

/// Per-invocation JVM parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Web driver selector (`xlt.webDriver`)
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "xltWebDriver")]
    pub driver: Option<String>,

    /// Browser window width hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Browser window height hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Alternate log4j configuration file
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "logConfigPath",
        alias = "log4jProperties"
    )]
    pub log_config_path: Option<String>,
}

impl RunParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn window(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn log_config(mut self, path: impl Into<String>) -> Self {
        self.log_config_path = Some(path.into());
        self
    }

    /// Fill unset fields from `defaults`
    pub fn or(&self, defaults: &RunParams) -> RunParams {
        RunParams {
            driver: self.driver.clone().or_else(|| defaults.driver.clone()),
            width: self.width.or(defaults.width),
            height: self.height.or(defaults.height),
            log_config_path: self
                .log_config_path
                .clone()
                .or_else(|| defaults.log_config_path.clone()),
        }
    }

    /// JVM system property arguments
    pub fn jvm_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(driver) = &self.driver {
            args.push(format!("-Dxlt.webDriver={driver}"));
        }
        if let Some(width) = self.width {
            args.push(format!("-Dxlt.webDriver.window.width={width}"));
        }
        if let Some(height) = self.height {
            args.push(format!("-Dxlt.webDriver.window.height={height}"));
        }
        if let Some(log_config) = &self.log_config_path {
            args.push(format!("-Dlog4j.configuration=file:{log_config}"));
        }

        args
    }
}

/// One scheduled test invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Path of the compiled class, e.g. `classes/tests/TSearch.class`
    pub path: String,

    #[serde(default)]
    pub params: RunParams,
}

impl WorkItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: RunParams::default(),
        }
    }

    /// Fully qualified class name, relative to `classes_dir`
    pub fn target_name(&self, classes_dir: &str) -> String {
        target_name(&self.path, classes_dir)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Turn a class file path into a fully qualified class name.
///
/// Everything up to and including the last `<classes_dir>/` component is
/// dropped, then the `.class` suffix, then separators become dots.
pub fn target_name(path: &str, classes_dir: &str) -> String {
    let normalized = path.replace('\\', "/");
    let dir = classes_dir.replace('\\', "/");
    let dir = dir.trim_start_matches("./").trim_end_matches('/');

    let relative = if dir.is_empty() {
        normalized.as_str()
    } else {
        let marker = format!("{dir}/");
        match normalized.rfind(&marker) {
            Some(idx) => &normalized[idx + marker.len()..],
            None => normalized.as_str(),
        }
    };

    relative
        .strip_suffix(CLASS_SUFFIX)
        .unwrap_or(relative)
        .trim_start_matches('/')
        .replace('/', ".")
}

/// Replaces the params of every work item whose path matches `pattern`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOverride {
    pub pattern: String,
    pub params: RunParams,
}

impl ParamOverride {
    pub fn new(pattern: impl Into<String>, params: RunParams) -> Self {
        Self {
            pattern: pattern.into(),
            params,
        }
    }
}

/// Apply overrides in order; a later matching pattern wins.
pub fn apply_overrides(items: &mut [WorkItem], overrides: &[ParamOverride]) -> XltResult<()> {
    let compiled = overrides
        .iter()
        .map(|o| {
            Regex::new(&o.pattern)
                .map(|re| (re, &o.params))
                .map_err(|e| XltError::configuration(format!("Invalid pattern '{}': {e}", o.pattern)))
        })
        .collect::<XltResult<Vec<_>>>()?;

    for item in items.iter_mut() {
        for (re, params) in &compiled {
            if re.is_match(&item.path) {
                item.params = (*params).clone();
            }
        }
    }

    Ok(())
}
