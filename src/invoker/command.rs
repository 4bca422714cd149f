//! Command construction
//!
//! Builds `javac` and `java` invocations. Commands run with the project base
//! directory as working directory, so every path argument is relative to it.

use std::fmt;
use std::path::PathBuf;

use crate::config::{XltPaths, SOURCES_FILE};
use crate::models::RunParams;

/// JUnit entry point used to run a test class
pub const JUNIT_RUNNER: &str = "org.junit.runner.JUnitCore";

#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: &str = ":";

/// A fully built external command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JavaCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
}

impl JavaCommand {
    pub fn new(program: impl Into<String>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.current_dir);
        cmd
    }

    pub fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.current_dir);
        cmd
    }
}

impl fmt::Display for JavaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// What `javac` should compile
#[derive(Clone, Debug)]
pub enum CompileSources {
    /// Every file listed in the generated source list
    SourceList,
    /// A single source file
    File(String),
}

/// Builds commands for one project
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    paths: XltPaths,
    java: String,
    javac: String,
}

impl CommandBuilder {
    pub fn new(paths: XltPaths) -> Self {
        Self {
            paths,
            java: "java".to_string(),
            javac: "javac".to_string(),
        }
    }

    /// Use the binaries of a specific JDK
    pub fn java_home(mut self, home: impl Into<PathBuf>) -> Self {
        let bin = home.into().join("bin");
        self.java = bin.join("java").to_string_lossy().to_string();
        self.javac = bin.join("javac").to_string_lossy().to_string();
        self
    }

    pub fn paths(&self) -> &XltPaths {
        &self.paths
    }

    /// Classpath used when running test classes
    pub fn run_classpath(&self) -> String {
        [
            self.paths.xlt_lib_classpath(),
            self.paths.classes_dir_name().trim_end_matches('/').to_string(),
            "config".to_string(),
        ]
        .join(CLASSPATH_SEPARATOR)
    }

    /// `java <props> -cp <classpath> org.junit.runner.JUnitCore <target>`
    pub fn run(&self, target: &str, params: &RunParams) -> JavaCommand {
        let params = params.or(&self.paths.default_params);

        JavaCommand::new(&self.java, self.paths.base_dir())
            .args(params.jvm_args())
            .arg("-cp")
            .arg(self.run_classpath())
            .arg(JUNIT_RUNNER)
            .arg(target)
    }

    /// `javac -classpath <xlt jars> -d <classes> <sources>`
    pub fn compile(&self, sources: CompileSources) -> JavaCommand {
        let cmd = JavaCommand::new(&self.javac, self.paths.base_dir())
            .arg("-classpath")
            .arg(self.paths.xlt_lib_classpath())
            .arg("-d")
            .arg(self.paths.classes_dir_name().trim_end_matches('/'));

        match sources {
            CompileSources::SourceList => cmd.arg(format!("@{SOURCES_FILE}")),
            CompileSources::File(path) => cmd.arg(path),
        }
    }

    /// `java -version`
    pub fn version(&self) -> JavaCommand {
        JavaCommand::new(&self.java, self.paths.base_dir()).arg("-version")
    }
}
