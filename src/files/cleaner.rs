//! Cleanup helpers
//!
//! Deleting something that does not exist is not an error.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use super::find_test_case_classes;
use crate::config::XltPaths;
use crate::error::XltResult;

/// Remove a directory tree; no-op when it does not exist
pub fn delete_dir_recursive(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove a single file; no-op when it does not exist
pub fn delete_file(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Delete every compiled test case class, keeping the directory layout
pub fn delete_all_test_case_classes(paths: &XltPaths) -> XltResult<usize> {
    let classes = if paths.classes_dir().exists() {
        find_test_case_classes(paths)?
    } else {
        Vec::new()
    };

    for class in &classes {
        delete_file(class)?;
    }
    Ok(classes.len())
}

/// Remove the compiled classes directory
pub fn delete_test_case_directory(paths: &XltPaths) -> XltResult<()> {
    delete_dir_recursive(paths.classes_dir())?;
    Ok(())
}

/// Remove the classes directory and the compiler source list
pub fn clean(paths: &XltPaths) -> XltResult<()> {
    delete_test_case_directory(paths)?;
    delete_file(paths.sources_file())?;
    Ok(())
}
