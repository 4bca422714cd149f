//! xlt-runner - compile and run XLT Java test cases
//!
//! Resolves an XLT project layout, optionally downloads XLT, compiles the
//! test case sources with `javac` and runs every compiled test class in its
//! own JVM with a bounded number of JVMs alive at once.
//!
//! ## Usage
//!
//! ```bash
//! # Fetch XLT into ./lib
//! xlt-runner download
//!
//! # Check, compile, run all and clean up
//! xlt-runner test -j 4
//!
//! # Run a single class with an explicit window size
//! xlt-runner run tests.TSearch --width 1280 --height 1024
//!
//! # Projects outside the current directory
//! xlt-runner --base-dir ./test/ run-all --format json -o results.json
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

mod cli;
mod config;
mod error;
mod executor;
mod files;
mod invoker;
mod models;
mod output;
mod provision;
mod utils;

use cli::{Args, Command, ConfigAction, RunAllArgs, RunArgs};
use config::{ConfigFile, EnvConfig, RunnerConfig, XltPaths};
use executor::{effective_limit, Compiler, ProcessPool, TestRunner};
use invoker::{CommandBuilder, JavaInvoker};
use models::RunSummary;
use output::{OutputFormat, ResultFormatter};
use provision::Provisioner;
use utils::logger::{init_logger, LogLevel};
use utils::Stopwatch;

/// Effective settings after merging file, environment and command line
struct Settings {
    source: Option<PathBuf>,
    file: ConfigFile,
    paths: XltPaths,
    runner: RunnerConfig,
    java_home: Option<PathBuf>,
}

impl Settings {
    /// Command line wins over environment, environment over config file
    fn resolve(args: &Args, env: &EnvConfig) -> Result<Self> {
        let source = args
            .config
            .clone()
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
            .or_else(ConfigFile::find);

        let file = match &source {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let options = file
            .xlt
            .clone()
            .overlay(&env.options())
            .overlay(&args.project.options());
        let paths = XltPaths::from_options(&options);

        let mut runner = file.runner.clone();
        if env.concurrency.is_some() {
            runner.max_concurrent = env.concurrency;
        }
        runner.timeout_secs = env.timeout_or(runner.timeout_secs);

        let java_home = args
            .project
            .java_home
            .clone()
            .or_else(|| env.java_home.as_ref().map(PathBuf::from));

        Ok(Self {
            source,
            file,
            paths,
            runner,
            java_home,
        })
    }

    /// Command builder for the project, using the configured JDK if any
    fn commands(&self) -> CommandBuilder {
        let commands = CommandBuilder::new(self.paths.clone());
        match &self.java_home {
            Some(home) => commands.java_home(home),
            None => commands,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(LogLevel::from_verbose(
        args.verbose || env.verbose.unwrap_or(false),
    ));

    let settings = Settings::resolve(&args, &env)?;
    if let Some(path) = &settings.source {
        info!("Using configuration from {}", path.display());
    }

    match args.command {
        Command::JavaVersion => {
            let version = provision::java_version(&settings.commands()).await?;
            println!("{version}");
        }
        Command::Download { mirror } => {
            download(settings.paths, mirror).await?;
        }
        Command::Check => {
            provision::check_prerequisites(&settings.paths)?;
            println!("✓ XLT found at {}", settings.paths.xlt_dir().display());
            println!("✓ Sources found at {}", settings.paths.sources_dir().display());
        }
        Command::Find { dir, pattern } => {
            for path in files::find_matching(&dir, &pattern)? {
                println!("{}", path.display());
            }
        }
        Command::Compile { file } => {
            let compiler = Compiler::new(settings.commands());
            match file {
                Some(file) => {
                    compiler.compile_single(&file).await?;
                    println!("✓ Compiled {file}");
                }
                None => {
                    let count = compiler.compile_all().await?;
                    println!("✓ Compiled {count} source file(s)");
                }
            }
        }
        Command::Run(run) => {
            run_single(&settings, run).await?;
        }
        Command::RunAll(run) => {
            let summary = run_all(&settings, &run).await?;
            if !summary.success {
                bail!(
                    "{} of {} test case(s) did not pass",
                    summary.total - summary.passed,
                    summary.total
                );
            }
        }
        Command::Test { run, keep_classes } => {
            test_pipeline(&settings, &run, keep_classes).await?;
        }
        Command::Clean { classes_only } => {
            if classes_only {
                let count = files::delete_all_test_case_classes(&settings.paths)?;
                println!("✓ Deleted {count} test case class(es)");
            } else {
                files::clean(&settings.paths)?;
                println!("✓ Removed {}", settings.paths.classes_dir().display());
            }
        }
        Command::Config { action } => {
            manage_config(action, &settings, &env)?;
        }
    }

    Ok(())
}

async fn download(paths: XltPaths, mirror: Option<String>) -> Result<()> {
    let mut provisioner = Provisioner::new(paths)?;
    if let Some(mirror) = mirror {
        provisioner = provisioner.releases_url(mirror);
    }

    let dir = provisioner.fetch_and_unpack().await?;
    println!("✓ XLT unpacked to {}", dir.display());

    Ok(())
}

async fn run_single(settings: &Settings, run: RunArgs) -> Result<()> {
    let params = run.params();
    let target = run.class.clone();
    let secs = run.timeout.unwrap_or(settings.runner.timeout_secs);
    let timeout = (secs > 0).then(|| Duration::from_secs(secs));
    let invoker = JavaInvoker::new(settings.commands());

    let passed = tokio::task::spawn_blocking(move || {
        invoker.run_blocking(&target, &params, timeout)
    })
    .await
    .context("Test run task failed")??;

    if passed {
        println!("✓ {} passed", run.class);
        Ok(())
    } else {
        bail!("{} failed", run.class)
    }
}

async fn run_all(settings: &Settings, args: &RunAllArgs) -> Result<RunSummary> {
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    let limit = args.concurrency.or(settings.runner.max_concurrent);
    let timeout = args.timeout.unwrap_or(settings.runner.timeout_secs);
    let invoker = JavaInvoker::new(settings.commands());
    let paths = invoker.paths().clone();

    let summary = if args.sequential {
        TestRunner::new(invoker, paths)
            .with_timeout(timeout)
            .run_all(&settings.runner.overrides)
            .await?
    } else {
        info!(
            "Running with up to {} concurrent JVM(s)",
            effective_limit(limit)
        );
        let pool = ProcessPool::new(invoker, paths.classes_dir_name()).with_timeout(timeout);
        let handle = pool.schedule_batch(
            &paths,
            None,
            &settings.runner.overrides,
            limit,
            |success| info!("All test cases finished, success: {}", success),
        )?;
        handle.await.context("Scheduler task failed")?
    };

    let formatter = ResultFormatter::new(format);
    println!("{}", formatter.format_summary(&summary));

    if let Some(path) = &args.output {
        output::write_summary_to_file(path, &summary, format)?;
        info!("Results written to {}", path);
    }

    Ok(summary)
}

async fn test_pipeline(settings: &Settings, run: &RunAllArgs, keep_classes: bool) -> Result<()> {
    let mut stopwatch = Stopwatch::new();

    provision::check_prerequisites(&settings.paths)?;
    stopwatch.lap("check");

    let compiled = Compiler::new(settings.commands()).compile_all().await?;
    info!("Compiled {} source file(s)", compiled);
    stopwatch.lap("compile");

    let result = run_all(settings, run).await;
    stopwatch.lap("run");

    if !keep_classes {
        if let Err(e) = files::clean(&settings.paths) {
            warn!("Failed to remove compiled classes: {}", e);
        }
        stopwatch.lap("clean");
    }

    info!("{}", stopwatch.format());

    let summary = result?;
    if !summary.success {
        bail!(
            "{} of {} test case(s) did not pass",
            summary.total - summary.passed,
            summary.total
        );
    }

    Ok(())
}

fn manage_config(action: ConfigAction, settings: &Settings, env: &EnvConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            match &settings.source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No configuration file found, using defaults"),
            }
            println!("{}", serde_yaml::to_string(&settings.file)?);

            println!("Effective Paths:");
            println!("  base:     {}", settings.paths.base_dir().display());
            println!("  sources:  {}", settings.paths.sources_dir().display());
            println!("  classes:  {}", settings.paths.classes_dir().display());
            println!("  xlt:      {}", settings.paths.xlt_dir().display());
            println!(
                "  workers:  {} | timeout: {}s",
                effective_limit(settings.runner.max_concurrent),
                settings.runner.timeout_secs
            );
            println!();

            if env.has_any() {
                env.print_summary();
            }
        }
        ConfigAction::Init { path } => {
            if path.exists() {
                bail!("Refusing to overwrite {}", path.display());
            }
            ConfigFile::example().save(&path)?;
            println!("✓ Wrote example configuration to {}", path.display());
        }
        ConfigAction::Env => {
            config::print_env_help();
        }
    }

    Ok(())
}
