//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::XltOptions;
use crate::models::RunParams;

/// Compile and run XLT test cases
#[derive(Parser, Debug)]
#[command(name = "xlt-runner")]
#[command(version)]
#[command(about = "Compile and run XLT Java test cases with bounded parallelism")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (logs captured JVM output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Project layout overrides, applied on top of config file and environment
#[derive(ClapArgs, Debug, Default)]
pub struct ProjectArgs {
    /// Project base directory
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// XLT installation, relative to the base directory
    #[arg(long, global = true)]
    pub xlt_path: Option<String>,

    /// XLT version
    #[arg(long, global = true)]
    pub xlt_version: Option<String>,

    /// Test sources directory, relative to the base directory
    #[arg(long, global = true)]
    pub src_dir: Option<String>,

    /// Compiled classes directory, relative to the base directory
    #[arg(long, global = true)]
    pub classes_dir: Option<String>,

    /// Default web driver (xlt.webDriver)
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Default log4j properties file
    #[arg(long, global = true)]
    pub log4j: Option<String>,

    /// JDK to use instead of `java`/`javac` from PATH
    #[arg(long, global = true)]
    pub java_home: Option<PathBuf>,
}

impl ProjectArgs {
    pub fn options(&self) -> XltOptions {
        XltOptions {
            base_dir: self.base_dir.clone(),
            path_to_xlt: self.xlt_path.clone(),
            xlt_version: self.xlt_version.clone(),
            test_src_dir: self.src_dir.clone(),
            test_classes_dir: self.classes_dir.clone(),
            xlt_web_driver: self.driver.clone(),
            log4j_properties: self.log4j.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the installed Java version
    JavaVersion,

    /// Download and unpack XLT into <base>/lib
    Download {
        /// Release server or mirror
        #[arg(long)]
        mirror: Option<String>,
    },

    /// Check that XLT and the sources directory exist
    Check,

    /// List files matching a glob pattern
    Find {
        /// Directory to search from
        dir: String,

        /// Glob pattern, e.g. "**/T*.java"
        pattern: String,
    },

    /// Compile test cases
    Compile {
        /// Compile only this source file (relative to the base directory)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Run a single test class
    Run(RunArgs),

    /// Run all compiled test classes
    RunAll(RunAllArgs),

    /// Check, compile, run all and clean up
    Test {
        #[command(flatten)]
        run: RunAllArgs,

        /// Keep compiled classes afterwards
        #[arg(long)]
        keep_classes: bool,
    },

    /// Remove compiled classes
    Clean {
        /// Delete test case classes only, keep the directory
        #[arg(long)]
        classes_only: bool,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for a single test class run
#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Fully qualified class name, e.g. tests.TSearch
    pub class: String,

    /// Web driver for this run
    #[arg(long)]
    pub run_driver: Option<String>,

    /// Browser window width
    #[arg(long)]
    pub width: Option<u32>,

    /// Browser window height
    #[arg(long)]
    pub height: Option<u32>,

    /// log4j properties for this run
    #[arg(long)]
    pub log_config: Option<String>,

    /// Kill the JVM after this many seconds, 0 disables
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl RunArgs {
    pub fn params(&self) -> RunParams {
        RunParams {
            driver: self.run_driver.clone(),
            width: self.width,
            height: self.height,
            log_config_path: self.log_config.clone(),
        }
    }
}

/// Arguments for running all test classes
#[derive(ClapArgs, Debug)]
pub struct RunAllArgs {
    /// Run one class at a time
    #[arg(long)]
    pub sequential: bool,

    /// Concurrent JVMs (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Per test class timeout in seconds, 0 disables
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Save results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write an example configuration file
    Init {
        /// Target file
        #[arg(default_value = "xlt-runner.yaml")]
        path: PathBuf,
    },

    /// List supported environment variables
    Env,
}
