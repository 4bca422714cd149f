//! Prerequisite checks

use regex::Regex;
use tracing::{debug, info};

use crate::config::XltPaths;
use crate::error::{XltError, XltResult};
use crate::invoker::CommandBuilder;

/// Extract the version from the first line of `java -version` output,
/// e.g. `java version "1.8.0_201"` or `openjdk version "17.0.2" 2022-01-18`
pub fn parse_java_version(output: &str) -> Option<String> {
    let first = output.lines().next()?;
    let re = Regex::new(r#"version "([^"]+)""#).ok()?;
    re.captures(first)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Version of the installed Java runtime
pub async fn java_version(commands: &CommandBuilder) -> XltResult<String> {
    let cmd = commands.version();
    debug!("{}", cmd);

    let output = cmd
        .to_tokio()
        .output()
        .await
        .map_err(|_| XltError::environment("No Java installed."))?;

    // java prints its version on stderr; some builds use stdout
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let version = parse_java_version(&stderr)
        .or_else(|| parse_java_version(&stdout))
        .ok_or_else(|| XltError::environment("No Java installed."))?;

    info!("Java {}", version);
    Ok(version)
}

/// Fail with a descriptive error when the XLT installation or the sources
/// directory is missing
pub fn check_prerequisites(paths: &XltPaths) -> XltResult<()> {
    let xlt_dir = paths.xlt_dir();
    if !xlt_dir.exists() {
        return Err(XltError::environment(format!(
            "XLT directory could not be found with the given path: {}",
            xlt_dir.display()
        )));
    }

    let sources_dir = paths.sources_dir();
    if !sources_dir.exists() {
        return Err(XltError::environment(format!(
            "Directory of the java sources could not be found with the given path: {}",
            sources_dir.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XltOptions;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_java_version() {
        assert_eq!(
            parse_java_version("java version \"1.8.0_201\"\nJava(TM) SE Runtime"),
            Some("1.8.0_201".to_string())
        );
        assert_eq!(
            parse_java_version("openjdk version \"17.0.2\" 2022-01-18\nOpenJDK Runtime"),
            Some("17.0.2".to_string())
        );
        assert_eq!(parse_java_version("command not found"), None);
        assert_eq!(parse_java_version(""), None);
    }

    #[test]
    fn test_check_prerequisites() {
        let dir = tempdir().unwrap();
        let options = XltOptions {
            base_dir: Some(dir.path().to_path_buf()),
            path_to_xlt: Some("xlt".to_string()),
            ..Default::default()
        };
        let paths = XltPaths::from_options(&options);

        let err = check_prerequisites(&paths).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("XLT directory could not be found with the given path"));

        fs::create_dir_all(dir.path().join("xlt")).unwrap();
        let err = check_prerequisites(&paths).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Directory of the java sources could not be found"));
        assert!(matches!(err, XltError::Environment(_)));

        fs::create_dir_all(dir.path().join("src")).unwrap();
        assert!(check_prerequisites(&paths).is_ok());
    }

    #[tokio::test]
    async fn test_java_version_missing_binary() {
        let dir = tempdir().unwrap();
        let paths = XltPaths::from_options(&XltOptions {
            base_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let commands = CommandBuilder::new(paths).java_home(dir.path().join("none"));

        let err = java_version(&commands).await.unwrap_err();
        assert_eq!(err.to_string(), "No Java installed.");
    }
}
