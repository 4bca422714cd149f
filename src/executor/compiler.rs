//! Test case compilation
//!
//! Compiles Java test case sources into the classes directory with `javac`.

use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::XltPaths;
use crate::error::{XltError, XltResult};
use crate::files::{delete_file, find_test_case_sources};
use crate::invoker::{CommandBuilder, CompileSources, JavaCommand};

/// Compiles test cases for one project
pub struct Compiler {
    commands: CommandBuilder,
}

impl Compiler {
    pub fn new(commands: CommandBuilder) -> Self {
        Self { commands }
    }

    fn paths(&self) -> &XltPaths {
        self.commands.paths()
    }

    /// Compile every discovered test case in one `javac` call.
    ///
    /// Returns the number of sources handed to the compiler.
    pub async fn compile_all(&self) -> XltResult<usize> {
        let sources = find_test_case_sources(self.paths())?;
        if sources.is_empty() {
            warn!(
                "No sources matching {} in {}",
                self.paths().test_cases_java,
                self.paths().sources_dir().display()
            );
            return Ok(0);
        }

        fs::create_dir_all(self.paths().classes_dir()).await?;

        let list = source_list(self.paths().base_dir(), &sources);
        let list_file = self.paths().sources_file();
        fs::write(&list_file, list).await?;

        let result = execute(&self.commands.compile(CompileSources::SourceList)).await;
        delete_file(&list_file)?;
        result?;

        info!("Compiled {} test case(s)", sources.len());
        Ok(sources.len())
    }

    /// Compile one source file, given relative to the base directory
    pub async fn compile_single(&self, path: &str) -> XltResult<()> {
        fs::create_dir_all(self.paths().classes_dir()).await?;
        execute(&self.commands.compile(CompileSources::File(path.to_string()))).await?;
        info!("Compiled {}", path);
        Ok(())
    }
}

/// One source per line, relative to the base directory
fn source_list(base_dir: &Path, sources: &[impl AsRef<Path>]) -> String {
    sources
        .iter()
        .map(|s| {
            let s = s.as_ref();
            let relative = s.strip_prefix(base_dir).unwrap_or(s);
            format!("{}\n", relative.to_string_lossy().replace('\\', "/"))
        })
        .collect()
}

async fn execute(cmd: &JavaCommand) -> XltResult<()> {
    info!("{}", cmd);

    let output = cmd
        .to_tokio()
        .output()
        .await
        .map_err(|source| XltError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(XltError::Compilation(stderr.trim().to_string()));
    }
    if !stderr.trim().is_empty() {
        debug!("javac: {}", stderr.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XltOptions;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_source_list_is_relative() {
        let base = PathBuf::from("/work/project");
        let sources = vec![
            base.join("src/shop/TSearch.java"),
            PathBuf::from("/elsewhere/TOther.java"),
        ];

        assert_eq!(
            source_list(&base, &sources),
            "src/shop/TSearch.java\n/elsewhere/TOther.java\n"
        );
    }

    #[tokio::test]
    async fn test_compile_all_without_sources() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        let compiler = Compiler::new(CommandBuilder::new(XltPaths::from_options(&XltOptions {
            base_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        })));

        assert_eq!(compiler.compile_all().await.unwrap(), 0);
        assert!(!dir.path().join("classes").exists());
    }

    #[tokio::test]
    async fn test_missing_javac_cleans_source_list() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src/pkg");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("TOne.java"), "class TOne {}").unwrap();

        let paths = XltPaths::from_options(&XltOptions {
            base_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let compiler = Compiler::new(
            CommandBuilder::new(paths.clone()).java_home(dir.path().join("no-jdk")),
        );

        let err = compiler.compile_all().await.unwrap_err();
        assert!(matches!(err, XltError::Spawn { .. }));
        assert!(!paths.sources_file().exists());
        assert!(paths.classes_dir().exists());
    }
}
