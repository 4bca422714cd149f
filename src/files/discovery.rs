//! Test case discovery
//!
//! Finds files below a directory using glob patterns such as `**/T*.java`.

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::XltPaths;
use crate::error::{XltError, XltResult};

/// Find all files below `base_dir` matching `pattern`, sorted by path
pub fn find_matching(base_dir: impl AsRef<Path>, pattern: &str) -> XltResult<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    if base_dir.as_os_str().is_empty() {
        return Err(XltError::configuration("No base directory given."));
    }
    if pattern.is_empty() {
        return Err(XltError::configuration("No pattern given."));
    }

    let root = Pattern::escape(&base_dir.to_string_lossy());
    let full = format!("{}/{}", root.trim_end_matches('/'), pattern.trim_start_matches("./"));

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = glob::glob_with(&full, options)
        .map_err(|e| XltError::configuration(format!("Invalid pattern '{pattern}': {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }
    files.sort();

    debug!("{} matched {} file(s)", full, files.len());
    Ok(files)
}

/// Java test case sources in the sources directory
pub fn find_test_case_sources(paths: &XltPaths) -> XltResult<Vec<PathBuf>> {
    find_matching(paths.sources_dir(), &paths.test_cases_java)
}

/// Compiled test case classes in the classes directory
pub fn find_test_case_classes(paths: &XltPaths) -> XltResult<Vec<PathBuf>> {
    find_matching(paths.classes_dir(), &paths.test_cases_class)
}
