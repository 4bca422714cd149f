//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::PathBuf;

use super::XltOptions;

/// Environment variable prefix
const ENV_PREFIX: &str = "XLT_RUNNER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Project directory from XLT_RUNNER_BASE_DIR
    pub base_dir: Option<String>,
    /// XLT installation from XLT_RUNNER_XLT_PATH
    pub xlt_path: Option<String>,
    /// XLT version from XLT_RUNNER_XLT_VERSION
    pub xlt_version: Option<String>,
    /// Web driver from XLT_RUNNER_WEB_DRIVER
    pub web_driver: Option<String>,
    /// log4j properties from XLT_RUNNER_LOG4J
    pub log4j: Option<String>,
    /// JDK from XLT_RUNNER_JAVA_HOME
    pub java_home: Option<String>,
    /// Concurrency limit from XLT_RUNNER_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Per-item timeout from XLT_RUNNER_TIMEOUT
    pub timeout: Option<u64>,
    /// Config file from XLT_RUNNER_CONFIG
    pub config_file: Option<String>,
    /// Verbose from XLT_RUNNER_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            base_dir: get_env("BASE_DIR"),
            xlt_path: get_env("XLT_PATH"),
            xlt_version: get_env("XLT_VERSION"),
            web_driver: get_env("WEB_DRIVER"),
            log4j: get_env("LOG4J"),
            java_home: get_env("JAVA_HOME"),
            concurrency: get_env_parse("CONCURRENCY"),
            timeout: get_env_parse("TIMEOUT"),
            config_file: get_env("CONFIG"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.base_dir.is_some()
            || self.xlt_path.is_some()
            || self.xlt_version.is_some()
            || self.web_driver.is_some()
            || self.log4j.is_some()
            || self.java_home.is_some()
            || self.concurrency.is_some()
            || self.timeout.is_some()
            || self.config_file.is_some()
            || self.verbose.is_some()
    }

    /// Options carried by the environment
    pub fn options(&self) -> XltOptions {
        XltOptions {
            base_dir: self.base_dir.as_ref().map(PathBuf::from),
            path_to_xlt: self.xlt_path.clone(),
            xlt_version: self.xlt_version.clone(),
            xlt_web_driver: self.web_driver.clone(),
            log4j_properties: self.log4j.clone(),
            ..Default::default()
        }
    }

    /// Get timeout with fallback
    pub fn timeout_or(&self, default: u64) -> u64 {
        self.timeout.unwrap_or(default)
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_BASE_DIR:     {:?}", ENV_PREFIX, self.base_dir);
        println!("  {}_XLT_PATH:     {:?}", ENV_PREFIX, self.xlt_path);
        println!("  {}_XLT_VERSION:  {:?}", ENV_PREFIX, self.xlt_version);
        println!("  {}_WEB_DRIVER:   {:?}", ENV_PREFIX, self.web_driver);
        println!("  {}_LOG4J:        {:?}", ENV_PREFIX, self.log4j);
        println!("  {}_JAVA_HOME:    {:?}", ENV_PREFIX, self.java_home);
        println!("  {}_CONCURRENCY:  {:?}", ENV_PREFIX, self.concurrency);
        println!("  {}_TIMEOUT:      {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_CONFIG:       {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_VERBOSE:      {:?}", ENV_PREFIX, self.verbose);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all XLT_RUNNER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BASE_DIR      Project base directory");
    println!("  {ENV_PREFIX}_XLT_PATH      XLT installation, relative to the base directory");
    println!("  {ENV_PREFIX}_XLT_VERSION   XLT version to download and use");
    println!("  {ENV_PREFIX}_WEB_DRIVER    Default web driver (xlt.webDriver)");
    println!("  {ENV_PREFIX}_LOG4J         Default log4j properties file");
    println!("  {ENV_PREFIX}_JAVA_HOME     JDK to use instead of java/javac from PATH");
    println!("  {ENV_PREFIX}_CONCURRENCY   Concurrent JVMs");
    println!("  {ENV_PREFIX}_TIMEOUT       Per test class timeout in seconds");
    println!("  {ENV_PREFIX}_CONFIG        Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE       Enable verbose output (true/false)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_CONCURRENCY=4");
    println!("  xlt-runner test");
}
